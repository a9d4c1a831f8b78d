use std::io::Read;
use std::str::FromStr;
use trawl_core::{FlowGraph, FoodWebModel, GraphBuilder, GraphOptions, LinkScale};
use trawl_render::{InteractiveView, Margin, SankeyConfig};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Graph(trawl_core::Error),
    Render(trawl_render::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Graph(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<trawl_core::Error> for CliError {
    fn from(value: trawl_core::Error) -> Self {
        Self::Graph(value)
    }
}

impl From<trawl_render::Error> for CliError {
    fn from(value: trawl_render::Error) -> Self {
        Self::Render(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Build,
    Layout,
    Render,
}

#[derive(Debug, Clone, Copy, Default)]
enum ScaleKind {
    #[default]
    Identity,
    Log1p,
    Sqrt,
}

impl FromStr for ScaleKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identity" => Ok(Self::Identity),
            "log1p" => Ok(Self::Log1p),
            "sqrt" => Ok(Self::Sqrt),
            _ => Err(()),
        }
    }
}

impl From<ScaleKind> for LinkScale {
    fn from(value: ScaleKind) -> Self {
        match value {
            ScaleKind::Identity => LinkScale::Identity,
            ScaleKind::Log1p => LinkScale::Log1p,
            ScaleKind::Sqrt => LinkScale::Sqrt,
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    round_to: f64,
    show_detritus: bool,
    link_scale: ScaleKind,
    width: f64,
    height: f64,
    node_width: f64,
    node_padding: f64,
    iterations: usize,
    curvature: f64,
    margin: f64,
    out: Option<String>,
}

fn usage() -> &'static str {
    "trawl-cli\n\
\n\
USAGE:\n\
  trawl-cli [build] [--pretty] [--round-to <f>] [--show-detritus] [--link-scale identity|log1p|sqrt] [<path>|-]\n\
  trawl-cli layout [--pretty] [build options] [layout options] [<path>|-]\n\
  trawl-cli render [build options] [layout options] [--out <path>] [<path>|-]\n\
\n\
LAYOUT OPTIONS:\n\
  --width <px> --height <px> --margin <px> --node-width <px> --node-padding <px>\n\
  --iterations <n> --curvature <0..1>\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Input is a food-web model export: a flow matrix plus per-group attributes.\n\
  - layout and render also accept a graph document previously printed by build.\n\
  - build prints the node/link graph JSON; layout prints positioned geometry JSON.\n\
  - render prints SVG to stdout by default; use --out to write a file.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let defaults = SankeyConfig::default();
    let mut args = Args {
        round_to: 0.1,
        width: defaults.width,
        height: defaults.height,
        node_width: defaults.node_width,
        node_padding: defaults.node_padding,
        iterations: defaults.iterations,
        curvature: defaults.curvature,
        margin: defaults.margin.top,
        ..Default::default()
    };

    fn next_f64(it: &mut impl Iterator<Item = String>) -> Result<f64, CliError> {
        let Some(v) = it.next() else {
            return Err(CliError::Usage(usage()));
        };
        let v = v.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
        if !v.is_finite() {
            return Err(CliError::Usage(usage()));
        }
        Ok(v)
    }

    let mut it = argv.iter().skip(1).cloned();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "build" => args.command = Command::Build,
            "layout" => args.command = Command::Layout,
            "render" => args.command = Command::Render,
            "--pretty" => args.pretty = true,
            "--show-detritus" => args.show_detritus = true,
            "--round-to" => args.round_to = next_f64(&mut it)?,
            "--width" => args.width = next_f64(&mut it)?,
            "--height" => args.height = next_f64(&mut it)?,
            "--margin" => args.margin = next_f64(&mut it)?,
            "--node-width" => args.node_width = next_f64(&mut it)?,
            "--node-padding" => args.node_padding = next_f64(&mut it)?,
            "--curvature" => args.curvature = next_f64(&mut it)?,
            "--iterations" => {
                let Some(n) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.iterations = n.parse::<usize>().map_err(|_| CliError::Usage(usage()))?;
            }
            "--link-scale" => {
                let Some(kind) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.link_scale = kind
                    .parse::<ScaleKind>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out);
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

fn write_json(value: &impl serde::Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
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

fn build_graph(args: &Args, text: &str) -> Result<FlowGraph, CliError> {
    let model: FoodWebModel = serde_json::from_str(text)?;
    let graph = GraphBuilder::new(GraphOptions {
        round_to: args.round_to,
        show_detritus: args.show_detritus,
        link_scale: args.link_scale.into(),
    })
    .build(&model)?;
    Ok(graph)
}

/// `layout` and `render` take either a model export or a graph already
/// produced by `build`. The two documents never share top-level keys
/// (`groups`/`flows` versus `nodes`/`links`), so the shape decides.
fn load_graph(args: &Args, text: &str) -> Result<FlowGraph, CliError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if value.get("groups").is_some() {
        build_graph(args, text)
    } else {
        Ok(serde_json::from_value(value)?)
    }
}

fn sankey_config(args: &Args) -> SankeyConfig {
    SankeyConfig {
        width: args.width,
        height: args.height,
        margin: Margin {
            top: args.margin,
            right: args.margin,
            bottom: args.margin,
            left: args.margin,
        },
        node_width: args.node_width,
        node_padding: args.node_padding,
        iterations: args.iterations,
        curvature: args.curvature,
        ..SankeyConfig::default()
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;

    match args.command {
        Command::Build => write_json(&build_graph(&args, &text)?, args.pretty),
        Command::Layout => {
            let graph = load_graph(&args, &text)?;
            let laid = trawl_render::layout(&graph, &sankey_config(&args))?;
            write_json(&laid, args.pretty)
        }
        Command::Render => {
            let graph = load_graph(&args, &text)?;
            let view = InteractiveView::new(&graph, sankey_config(&args))?;
            let svg = trawl_render::render_svg(view.layout(), view.routes());
            write_text(&svg, args.out.as_deref())
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

    match run(args) {
        Ok(()) => {}
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
