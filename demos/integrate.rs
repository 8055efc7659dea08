use clap::Parser;

use ion_rs::dot::DotConfig;
use ion_rs::graph::{Edge, Graph, Node};
use ion_rs::ion::{Ion, IonConfig};
use ion_rs::knowledge::BackgroundKnowledge;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Print the resulting PAGs in DOT format.
    #[clap(long)]
    dot: bool,

    /// Block paths of all lengths at once instead of by increasing length.
    #[clap(long)]
    no_path_length_search: bool,

    /// Block the paths of one separated pair at a time.
    #[clap(long)]
    adjacency_search: bool,

    /// Allow removing edges between variables never measured together.
    #[clap(long)]
    remove_placeholder_edges: bool,

    /// Forbid an edge, given as `FROM,TO`.
    #[clap(long, value_name = "FROM,TO", value_parser = parse_pair)]
    forbid: Vec<(String, String)>,

    /// Log level.
    #[clap(long, value_name = "LEVEL", default_value = "info")]
    log_level: simplelog::LevelFilter,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once(',') {
        Some((from, to)) if !from.is_empty() && !to.is_empty() => Ok((from.to_string(), to.to_string())),
        _ => Err(format!("expected FROM,TO, got `{}`", s)),
    }
}

/// Two PAGs sharing `B` and `C`:
/// - over {A, B, C}: `A o-> B <-o C`
/// - over {B, C, D}: `B o-o C o-o D`
fn inputs() -> Vec<Graph> {
    let (a, b, c, d) = (Node::new("A"), Node::new("B"), Node::new("C"), Node::new("D"));

    let mut g1 = Graph::new([a.clone(), b.clone(), c.clone()]);
    g1.add_edge(Edge::partially_oriented(&a, &b));
    g1.add_edge(Edge::partially_oriented(&c, &b));

    let mut g2 = Graph::new([b.clone(), c.clone(), d.clone()]);
    g2.add_edge(Edge::nondirected(&b, &c));
    g2.add_edge(Edge::nondirected(&c, &d));

    vec![g1, g2]
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        args.log_level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    let inputs = inputs();
    for (i, input) in inputs.iter().enumerate() {
        println!("Input {}:\n{}", i + 1, input);
    }

    let config = IonConfig {
        path_length_search: !args.no_path_length_search,
        adjacency_search: args.adjacency_search,
        remove_placeholder_edges: args.remove_placeholder_edges,
    };
    let mut ion = Ion::new(inputs)?.with_config(config);
    if !args.forbid.is_empty() {
        let mut knowledge = BackgroundKnowledge::new();
        for (from, to) in &args.forbid {
            knowledge.set_forbidden(from, to);
        }
        ion = ion.with_knowledge(knowledge)?;
    }

    let pags = ion.search();
    println!("Found {} PAGs", pags.len());
    for (i, pag) in pags.iter().enumerate() {
        if args.dot {
            println!("// PAG {}", i + 1);
            print!("{}", pag.to_dot_with_config(&DotConfig::default())?);
        } else {
            println!("PAG {}:\n{}", i + 1, pag);
        }
    }

    let stats = ion.stats();
    println!("runtime: {:.3}s", stats.runtime.as_secs_f64());
    println!(
        "step 3: {} iterations, largest {}, average {:.2}",
        stats.total_iterations(),
        stats.largest_iteration(),
        stats.average_iteration()
    );
    println!(
        "hitting sets: {} calls, average {:?}, longest {:?}",
        stats.hitting_set_calls,
        stats.average_hitting_set_time(),
        stats.hitting_set_longest
    );
    println!(
        "candidates: {} after step 3, {} after step 4, {} final",
        stats.step3_candidates, stats.step4_candidates, stats.step5_candidates
    );
    println!("disambiguations: {}", stats.disambiguation_branches);

    Ok(())
}
