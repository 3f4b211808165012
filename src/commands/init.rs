use crate::cli::InitArgs;
use crate::store::Store;
use crate::utils::Result;

pub fn init(args: InitArgs) -> Result<()> {
    Store::create(&args.db_path)?;
    log::info!("Initialized bait database at {}", args.db_path.display());
    Ok(())
}
