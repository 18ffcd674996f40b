use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::process;

use asdl_compiler_cli::depgraph::{run_depgraph_dump, DepgraphArgs};
use asdl_compiler_cli::netlist_cmd::{run_netlist, NetlistArgs};
use asdl_compiler_cli::schema_cmd::run_schema;
use asdl_compiler_cli::visualizer::{run_visualizer_dump, VisualizerArgs};

fn main() {
    let matches = Command::new("asdlc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("ASDL schematic compiler")
        .subcommand_required(true)
        .subcommand(
            Command::new("netlist")
                .about("Compile an entry file into a netlist")
                .arg(Arg::new("entry").value_name("ENTRY").required(true))
                .arg(
                    Arg::new("backend")
                        .long("backend")
                        .value_name("NAME")
                        .help("Backend to emit for, e.g. sim.ngspice"),
                )
                .arg(
                    Arg::new("lib")
                        .long("lib")
                        .value_name("PATH")
                        .action(ArgAction::Append)
                        .help("Additional library root (repeatable)"),
                )
                .arg(Arg::new("output").short('o').long("output").value_name("PATH"))
                .arg(Arg::new("log").long("log").value_name("PATH"))
                .arg(
                    Arg::new("view-config")
                        .long("view-config")
                        .value_name("PATH")
                        .help("View config with binding profiles"),
                )
                .arg(
                    Arg::new("profile")
                        .long("profile")
                        .value_name("NAME")
                        .action(ArgAction::Append)
                        .help("View profile to apply (repeatable)"),
                )
                .arg(
                    Arg::new("top-as-subckt")
                        .long("top-as-subckt")
                        .action(ArgAction::SetTrue)
                        .help("Emit the top module as a subckt"),
                ),
        )
        .subcommand(
            Command::new("visualizer-dump")
                .about("Dump a module graph as JSON for the visualizer")
                .arg(
                    Arg::new("files")
                        .value_name("FILES")
                        .action(ArgAction::Append)
                        .required(true),
                )
                .arg(Arg::new("module").long("module").value_name("NAME"))
                .arg(
                    Arg::new("list-modules")
                        .long("list-modules")
                        .action(ArgAction::SetTrue),
                )
                .arg(Arg::new("compact").long("compact").action(ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("depgraph-dump")
                .about("Dump the module dependency graph as JSON")
                .arg(
                    Arg::new("entries")
                        .value_name("ENTRIES")
                        .action(ArgAction::Append)
                        .required(true),
                )
                .arg(Arg::new("output").short('o').long("output").value_name("PATH")),
        )
        .subcommand(Command::new("schema").about("Emit schema.json and schema.txt"))
        .get_matches();

    let code = match matches.subcommand() {
        Some(("netlist", sub)) => {
            let args = NetlistArgs {
                entry: PathBuf::from(sub.get_one::<String>("entry").expect("required")),
                backend: sub.get_one::<String>("backend").cloned(),
                libs: sub
                    .get_many::<String>("lib")
                    .unwrap_or_default()
                    .map(PathBuf::from)
                    .collect(),
                output: sub.get_one::<String>("output").map(PathBuf::from),
                log: sub.get_one::<String>("log").map(PathBuf::from),
                view_config: sub.get_one::<String>("view-config").map(PathBuf::from),
                profiles: sub
                    .get_many::<String>("profile")
                    .unwrap_or_default()
                    .cloned()
                    .collect(),
                top_as_subckt: sub.get_flag("top-as-subckt"),
            };
            run_netlist(&args)
        }
        Some(("visualizer-dump", sub)) => {
            let args = VisualizerArgs {
                files: sub
                    .get_many::<String>("files")
                    .unwrap_or_default()
                    .map(PathBuf::from)
                    .collect(),
                module: sub.get_one::<String>("module").cloned(),
                list_modules: sub.get_flag("list-modules"),
                compact: sub.get_flag("compact"),
            };
            run_visualizer_dump(&args)
        }
        Some(("depgraph-dump", sub)) => {
            let args = DepgraphArgs {
                entries: sub
                    .get_many::<String>("entries")
                    .unwrap_or_default()
                    .map(PathBuf::from)
                    .collect(),
                output: sub.get_one::<String>("output").map(PathBuf::from),
            };
            run_depgraph_dump(&args)
        }
        Some(("schema", _)) => run_schema(),
        _ => 2,
    };
    process::exit(code);
}
