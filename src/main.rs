fn main() -> anyhow::Result<()> {
    folio_theme::run()?;
    Ok(())
}
