//! RrmKit CLI - Command-line interface for RRM model recovery

pub mod commands;
pub mod progress;

use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "rrmkit")]
#[command(version, about = "RrmKit: recover meshes from RRM model containers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Run the RrmKit CLI
///
/// # Errors
/// Returns the first error of the executed command.
pub fn run_cli() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    cli.command.execute()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::commands::ConvertCommands;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("rrmkit").chain(args.iter().copied()))
    }

    #[test]
    fn test_convert_directions_parse() {
        let cli = parse(&["convert", "rrm-to-mesh", "in.rrm", "out.obj", "--uv-set", "1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Convert {
                command: ConvertCommands::RrmToMesh { ref input, no_texture: false, .. }
            } if input == &PathBuf::from("in.rrm")
        ));

        let cli = parse(&["convert", "mesh-to-rrm", "in.obj", "out.rrm", "--no-texture"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Convert {
                command: ConvertCommands::MeshToRrm { ref output, no_texture: true, .. }
            } if output == &PathBuf::from("out.rrm")
        ));

        assert!(parse(&["convert", "auto", "in.rrm", "out.obj"]).is_ok());
    }

    #[test]
    fn test_convert_requires_direction_and_paths() {
        assert!(parse(&["convert", "in.rrm", "out.obj"]).is_err());
        assert!(parse(&["convert", "rrm-to-mesh", "in.rrm"]).is_err());
        // The container direction has no recovery settings.
        assert!(parse(&["convert", "mesh-to-rrm", "in.obj", "out.rrm", "--uv-set", "1"]).is_err());
    }
}
