fn main() -> anyhow::Result<()> {
    rrmkit::cli::run_cli()
}
