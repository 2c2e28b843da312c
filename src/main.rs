use mongodb::{
    options::{ClientOptions, ResolverConfig},
    Client,
};
use ohc2mongo::basin::BasinMask;
use ohc2mongo::cube::Cube;
use ohc2mongo::docs::{kg21_metadata, MetaDoc, PointDoc, DATASET_ID};
use ohc2mongo::grid::GridAxes;
use ohc2mongo::upsert::{insert_metadata, load_points};
use std::env;
use std::error::Error;
use tracing::{error, info};

const SOURCE_FILE: &str =
    "/tmp/ohc/fullFieldSpaceTrendPchipPotTempGCOS_0015_0300_5_20_10_tseries_global_Blanca.nc";
const SOURCE_VAR: &str = "d_GCOS_temp_zint";
const BASIN_MASK_FILE: &str = "parameters/basinmask_01.nc";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    // mongodb setup ///////////////////////////////////////////
    // Load the MongoDB connection string from an environment variable:
    let client_uri =
        env::var("MONGODB_URI").expect("You must set the MONGODB_URI environment var!");

    // A Client is needed to connect to MongoDB:
    // An extra line of code to work around a DNS issue on Windows:
    let options =
        ClientOptions::parse_with_resolver_config(&client_uri, ResolverConfig::cloudflare())
            .await?;
    let client = Client::with_options(options)?;
    let meta_collection = client.database("argo").collection::<MetaDoc>("kg21Meta");
    let point_collection = client.database("argo").collection::<PointDoc>("kg21");

    // source cube and basin mask; a missing or misshapen file is fatal here,
    // before anything has been written
    let cube = Cube::open(SOURCE_FILE, SOURCE_VAR, GridAxes::kg21())?;
    let mask = BasinMask::open(BASIN_MASK_FILE)?;

    // write metadata to the grid metadata collection
    let meta = kg21_metadata(&cube.axes);
    if let Err(err) = insert_metadata(&meta_collection, &meta).await {
        error!(%err, record = ?meta, "metadata write failure");
    }

    // construct and reconcile data records
    let summary = load_points(&cube, &mask, &point_collection, DATASET_ID).await;
    info!(%summary, "load complete");

    Ok(())
}
