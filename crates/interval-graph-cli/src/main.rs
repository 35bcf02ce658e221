mod edge_list;

use edge_list::EdgeListError;
use interval_graph::{Graph, Recognition, RecognizeOptions, VertexId, recognize_with_options};
use std::fmt::Write as _;
use std::io::Read;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Json(serde_json::Error),
    EdgeList(EdgeListError),
    Engine(interval_graph::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::EdgeList(err) => write!(f, "invalid graph file: {err}"),
            CliError::Engine(err) => write!(f, "{err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<EdgeListError> for CliError {
    fn from(value: EdgeListError) -> Self {
        Self::EdgeList(value)
    }
}

impl From<interval_graph::Error> for CliError {
    fn from(value: interval_graph::Error) -> Self {
        Self::Engine(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Recognize,
    Convert,
    Complete,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    json: bool,
    pretty: bool,
    fast: bool,
    no_paths: bool,
    vertices: Option<usize>,
    out: Option<String>,
}

fn usage() -> &'static str {
    "interval-graph\n\
\n\
USAGE:\n\
  interval-graph [recognize] [--json] [--pretty] [--fast] [--no-paths] [--out <path>] [<path>|-]\n\
  interval-graph convert [--out <path>] [<path>|-]\n\
  interval-graph complete --vertices <n> [--out <path>]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', the graph file is read from stdin.\n\
  - recognize prints a text report by default; --json prints the outcome as JSON.\n\
  - --fast skips re-checking the interval representation against the graph.\n\
  - convert rewrites a graph file with its edges in depth-first order.\n\
  - complete writes the complete graph on <n> vertices.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "recognize" => args.command = Command::Recognize,
            "convert" => args.command = Command::Convert,
            "complete" => args.command = Command::Complete,
            "--json" => args.json = true,
            "--pretty" => {
                args.json = true;
                args.pretty = true;
            }
            "--fast" => args.fast = true,
            "--no-paths" => args.no_paths = true,
            "--vertices" => {
                let Some(n) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.vertices = Some(n.parse::<usize>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    if matches!(args.command, Command::Complete) && args.vertices.is_none() {
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn label(graph: &Graph, v: VertexId) -> String {
    match graph.label(v) {
        Some(label) => label.to_string(),
        None => format!("#{v}"),
    }
}

fn join_labels(graph: &Graph, vertices: &[VertexId], sep: &str) -> String {
    vertices
        .iter()
        .map(|&v| label(graph, v))
        .collect::<Vec<_>>()
        .join(sep)
}

fn render_report(graph: &Graph, outcome: &Recognition) -> String {
    let mut out = String::new();
    match outcome {
        Recognition::Chordal { intervals, .. } => {
            let _ = writeln!(out, "Interval representation:");
            for (&v, interval) in intervals {
                let _ = writeln!(
                    out,
                    "{}: {}..{}",
                    label(graph, v),
                    interval.start,
                    interval.end
                );
            }
        }
        Recognition::NotChordal { cycle } => {
            let _ = writeln!(out, "Not an interval graph: the graph is not chordal.");
            let _ = writeln!(out, "Chordless cycle:");
            let _ = writeln!(out, "{}", join_labels(graph, cycle, " - "));
        }
        Recognition::NotInterval {
            asteroidal_triple,
            paths,
        } => {
            let _ = writeln!(out, "Not an interval graph: the graph has an asteroidal triple.");
            let _ = writeln!(out, "Asteroidal triple:");
            let _ = writeln!(out, "{}", join_labels(graph, asteroidal_triple, ", "));
            for path in paths {
                let _ = writeln!(out, "Path:");
                let _ = writeln!(out, "{}", join_labels(graph, path, " - "));
            }
        }
    }
    out
}

fn run(args: Args) -> Result<(), CliError> {
    match args.command {
        Command::Complete => {
            let Some(n) = args.vertices else {
                return Err(CliError::Usage(usage()));
            };
            write_text(&edge_list::write(&Graph::complete(n)), args.out.as_deref())
        }
        Command::Convert => {
            let graph = edge_list::parse(&read_input(args.input.as_deref())?)?;
            write_text(&edge_list::write(&graph), args.out.as_deref())
        }
        Command::Recognize => {
            let graph = edge_list::parse(&read_input(args.input.as_deref())?)?;
            let mut options = if args.fast {
                RecognizeOptions::fast()
            } else {
                RecognizeOptions::strict()
            };
            options.with_paths = !args.no_paths;

            let outcome = recognize_with_options(&graph, options)?;
            let text = if args.json {
                let mut json = if args.pretty {
                    serde_json::to_string_pretty(&outcome)?
                } else {
                    serde_json::to_string(&outcome)?
                };
                json.push('\n');
                json
            } else {
                render_report(&graph, &outcome)
            };
            write_text(&text, args.out.as_deref())
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
