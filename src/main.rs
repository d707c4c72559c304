use clap::{Parser, Subcommand};

mod cmd;
mod core;

#[derive(Parser, Debug)]
#[command(
    name = "casacalc",
    version,
    about = "Spanish property purchase and sale cost calculator"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cost breakdown for a buyer, a seller, or the whole transaction
    Calc(cmd::calc::CalcCommand),
    /// Regional transfer tax (ITP) for a resale purchase
    Itp(cmd::itp::ItpCommand),
    /// List the regional tax table
    Regions(cmd::regions::RegionsCommand),
    /// Print the request input format
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Calc(calc) => calc.exec(),
        Command::Itp(itp) => itp.exec(),
        Command::Regions(regions) => regions.exec(),
        Command::Schema(schema) => schema.exec(),
    }
}
