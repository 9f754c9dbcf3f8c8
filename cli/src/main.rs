use anyhow::Result;

fn main() -> Result<()> {
    ldo_cli::run()
}
