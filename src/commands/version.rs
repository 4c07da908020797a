use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("pagewatch version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
