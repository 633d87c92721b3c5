use anyhow::Result;

fn main() -> Result<()> {
    gcode_leveller::cli::run()
}
