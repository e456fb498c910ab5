/// Preview: interactive terminal player for authored dialogue graphs.
///
/// Usage: preview <graph.ron> [--seed <n>] [--character <name=id>]...
///
/// Plays the graph from its entry node, printing speech and event lines and
/// prompting on stdin at every choice. When a scene ends by chaining, the
/// successor graph is looked up as a sibling .ron file and the variable
/// store carries over.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use dialogue_engine::core::session::{DialogueEvent, DialogueSession, EndReason, SessionState};
use dialogue_engine::core::store::VariableStore;
use dialogue_engine::schema::character::{CharacterDirectory, CharacterId};
use dialogue_engine::schema::graph::DialogueGraph;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut graph_path: Option<PathBuf> = None;
    let mut seed: u64 = 42;
    let mut characters = CharacterDirectory::new();
    let mut names: Vec<(CharacterId, String)> = Vec::new();
    let mut next_character_id: u64 = 1;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            "--character" if i + 1 < args.len() => {
                i += 1;
                let spec = &args[i];
                match spec.split_once('=') {
                    Some((name, id)) => match id.parse() {
                        Ok(id) => {
                            characters.register(name, CharacterId(id));
                            names.push((CharacterId(id), name.to_string()));
                        }
                        Err(_) => {
                            eprintln!("Invalid character id in '{}'", spec);
                            std::process::exit(1);
                        }
                    },
                    None => {
                        characters.register(spec.as_str(), CharacterId(next_character_id));
                        names.push((CharacterId(next_character_id), spec.clone()));
                        next_character_id += 1;
                    }
                }
            }
            arg if graph_path.is_none() && !arg.starts_with("--") => {
                graph_path = Some(PathBuf::from(arg));
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(graph_path) = graph_path else {
        print_usage();
        std::process::exit(1);
    };

    let mut graph = match DialogueGraph::load_from_ron(&graph_path, &characters) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("ERROR loading {}: {}", graph_path.display(), e);
            std::process::exit(1);
        }
    };
    let scene_dir: PathBuf = graph_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    println!(
        "Loaded '{}' ({} nodes, {} links). Seed: {}\n",
        graph.name(),
        graph.node_count(),
        graph.link_count(),
        seed
    );

    let mut store = VariableStore::new();
    loop {
        let carried = play_scene(&graph, store.clone(), seed, &names);
        match carried {
            SceneOutcome::Done => break,
            SceneOutcome::Chain { next, store: next_store } => {
                let next_path = scene_dir.join(format!("{}.ron", next));
                if !next_path.exists() {
                    println!("(next scene '{}' not found at {})", next, next_path.display());
                    break;
                }
                graph = match DialogueGraph::load_from_ron(&next_path, &characters) {
                    Ok(g) => g,
                    Err(e) => {
                        eprintln!("ERROR loading {}: {}", next_path.display(), e);
                        break;
                    }
                };
                println!("\n--- {} ---\n", graph.name());
                store = next_store;
            }
        }
    }
}

enum SceneOutcome {
    Done,
    Chain { next: String, store: VariableStore },
}

fn play_scene(
    graph: &DialogueGraph,
    store: VariableStore,
    seed: u64,
    names: &[(CharacterId, String)],
) -> SceneOutcome {
    let mut session = DialogueSession::new(graph, store, seed);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        let event = match session.state() {
            SessionState::AwaitingChoice { choices, .. } => {
                let count = choices.len();
                print!("> ");
                stdout.flush().ok();

                let mut line = String::new();
                if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
                    return SceneOutcome::Done;
                }
                let picked = match line.trim().parse::<usize>() {
                    Ok(n) if n >= 1 && n <= count => n - 1,
                    _ => {
                        println!("Pick a number between 1 and {}.", count);
                        continue;
                    }
                };
                match session.resume(picked) {
                    Ok(event) => event,
                    Err(e) => {
                        eprintln!("ERROR: {}", e);
                        return SceneOutcome::Done;
                    }
                }
            }
            _ => match session.advance() {
                Ok(event) => event,
                Err(e) => {
                    eprintln!("ERROR: {}", e);
                    return SceneOutcome::Done;
                }
            },
        };

        match event {
            DialogueEvent::Speech { text, speaker, .. } => match speaker {
                Some(id) => println!("{}: {}", speaker_name(names, id), text),
                None => println!("{}", text),
            },
            DialogueEvent::Choices { labels } => {
                println!();
                for (i, label) in labels.iter().enumerate() {
                    println!("  {}. {}", i + 1, label);
                }
            }
            DialogueEvent::Event { handler } => {
                println!("[event: {}]", handler);
            }
            DialogueEvent::Ended { reason } => {
                return match reason {
                    EndReason::Terminate => {
                        println!("\n(The dialogue ends.)");
                        SceneOutcome::Done
                    }
                    EndReason::ChainTo(next) => SceneOutcome::Chain {
                        next,
                        store: session.store().clone(),
                    },
                    EndReason::DeadEnd => {
                        println!("\n(The scene trails off: dead end.)");
                        SceneOutcome::Done
                    }
                    EndReason::MutationFailure | EndReason::BranchFailure => {
                        eprintln!("\nScene aborted: {:?}", reason);
                        SceneOutcome::Done
                    }
                };
            }
        }
    }
}

/// Reverse lookup for display. The list is small; a scan is fine.
fn speaker_name(names: &[(CharacterId, String)], id: CharacterId) -> String {
    names
        .iter()
        .find(|(cid, _)| *cid == id)
        .map(|(_, name)| name.clone())
        .unwrap_or_else(|| format!("#{}", id.0))
}

fn print_usage() {
    println!("Preview: interactive terminal player for authored dialogue graphs.");
    println!();
    println!("Usage: preview <graph.ron> [--seed <n>] [--character <name=id>]...");
    println!();
    println!("  <graph.ron>            Path to a dialogue graph file");
    println!("  --seed <n>             RNG seed for random branches (default: 42)");
    println!("  --character <name=id>  Register a character so speakers resolve;");
    println!("                         bare names are assigned ids in order");
}
