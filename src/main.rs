//! Settlement Sim - Entry Point
//!
//! Loads a starting configuration, then runs an interactive console over a
//! `Session`. Time only moves when the player ticks.

use clap::Parser;
use settlement_sim::campaign::battle::BattleOutcome;
use settlement_sim::campaign::expedition::{ExpeditionKind, ExpeditionRequest, ExpeditionStatus};
use settlement_sim::city::building::BuildingType;
use settlement_sim::city::construction;
use settlement_sim::city::resource::{Amounts, ResourceType};
use settlement_sim::core::config::EngineConfig;
use settlement_sim::core::error::Result;
use settlement_sim::core::types::{ExpeditionId, TileCoord, Timestamp, MILLIS_PER_MINUTE};
use settlement_sim::military::unit::{Army, UnitType};
use settlement_sim::simulation::{GameEvent, Session, HOME_SETTLEMENT};

use std::io::{self, Write};
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = "data/settlement.toml";

/// Settlement Sim - build, train and raid from a console
#[derive(Parser, Debug)]
#[command(name = "settlement-sim")]
#[command(about = "Run a settlement interactively from the console")]
struct Args {
    /// Starting configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Load a saved JSON snapshot instead of starting fresh
    #[arg(long)]
    load: Option<PathBuf>,

    /// Log filter passed to tracing
    #[arg(long, default_value = "settlement_sim=info")]
    log: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(args.log.as_str())
        .init();

    let config = match &args.config {
        Some(path) => EngineConfig::load_from_toml(path)?,
        None if PathBuf::from(DEFAULT_CONFIG).exists() => {
            EngineConfig::load_from_toml(&PathBuf::from(DEFAULT_CONFIG))?
        }
        None => EngineConfig::default(),
    };

    let mut session = match &args.load {
        Some(path) => Session::import_json(&std::fs::read_to_string(path)?)?,
        None => Session::from_config(&config)?,
    };
    let step = config.tick_interval_ms.max(1);

    println!("\n=== SETTLEMENT SIM ===");
    print_help();

    loop {
        display_status(&session);

        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let words: Vec<&str> = input.split_whitespace().collect();
        let Some((&command, rest)) = words.split_first() else {
            continue;
        };

        match command {
            "quit" | "q" => break,
            "help" | "h" => print_help(),
            "tick" | "t" => {
                let Some(target) = tick_target(session.now(), rest.first().copied(), step) else {
                    println!("Usage: tick [minutes]");
                    continue;
                };
                let events = session.tick(target);
                print_events(&events);
            }
            "run" => match rest.first().and_then(|n| n.parse::<u32>().ok()) {
                Some(n) => {
                    let mut events = Vec::new();
                    for _ in 0..n {
                        events.extend(session.tick(session.now().saturating_add(step)));
                    }
                    print_events(&events);
                    println!("Ran {} ticks.", n);
                }
                None => println!("Usage: run <ticks>"),
            },
            "upgrade" | "u" => match rest.first().map(|b| b.parse::<BuildingType>()) {
                Some(Ok(building)) => match session.start_upgrade(HOME_SETTLEMENT, building) {
                    Ok(order) => println!(
                        "Upgrading {} to level {} (done at {}).",
                        building, order.target_level, order.completes_at
                    ),
                    Err(e) => println!("Cannot upgrade: {}", e),
                },
                Some(Err(e)) => println!("Unknown {}", e),
                None => println!("Usage: upgrade <building>"),
            },
            "train" => {
                let unit = rest.first().map(|u| u.parse::<UnitType>());
                let quantity = rest.get(1).and_then(|q| q.parse::<u32>().ok());
                match (unit, quantity) {
                    (Some(Ok(unit)), Some(quantity)) => {
                        match session.start_training(HOME_SETTLEMENT, unit, quantity) {
                            Ok(order) => println!(
                                "Training {} {} (done at {}).",
                                quantity, unit, order.completes_at
                            ),
                            Err(e) => println!("Cannot train: {}", e),
                        }
                    }
                    (Some(Err(e)), _) => println!("Unknown {}", e),
                    _ => println!("Usage: train <unit> <quantity>"),
                }
            }
            "collect" | "c" => {
                let resource = match rest.first().map(|r| r.parse::<ResourceType>()) {
                    Some(Ok(r)) => Some(r),
                    Some(Err(e)) => {
                        println!("Unknown {}", e);
                        continue;
                    }
                    None => None,
                };
                match session.collect_resources(HOME_SETTLEMENT, resource) {
                    Ok(collected) => println!("Collected {}.", collected),
                    Err(e) => println!("Cannot collect: {}", e),
                }
            }
            "march" | "m" => match parse_march(rest) {
                Ok(request) => match session.create_expedition(HOME_SETTLEMENT, request) {
                    Ok(exp) => println!(
                        "Planned {} to {} at {}: {} minutes each way. Confirm to depart.",
                        exp.id, exp.target.info.name, exp.target.coord, exp.travel_minutes
                    ),
                    Err(e) => println!("Cannot march: {}", e),
                },
                Err(usage) => println!("{}", usage),
            },
            "confirm" => match parse_id(rest) {
                Some(id) => match session.confirm_expedition(id) {
                    Ok(()) => println!("{} is marching.", id),
                    Err(e) => println!("Cannot confirm: {}", e),
                },
                None => println!("Usage: confirm <expedition>"),
            },
            "cancel" => match parse_id(rest) {
                Some(id) => match session.cancel_expedition(id) {
                    Ok(()) => println!("{} cancelled.", id),
                    Err(e) => println!("Cannot cancel: {}", e),
                },
                None => println!("Usage: cancel <expedition>"),
            },
            "resolve" => match (parse_id(rest), parse_outcome(rest.get(1..).unwrap_or(&[]))) {
                (Some(id), Ok(outcome)) => match session.attach_outcome(id, outcome) {
                    Ok(()) => println!("{} is heading home.", id),
                    Err(e) => println!("Cannot resolve: {}", e),
                },
                (_, Err(msg)) => println!("{}", msg),
                (None, _) => {
                    println!("Usage: resolve <expedition> [<resource>=<n>|<unit>=<lost>]...")
                }
            },
            "world" | "w" => {
                let radius = rest.first().and_then(|r| r.parse::<i32>().ok()).unwrap_or(1);
                display_world(&mut session, radius);
            }
            "status" | "s" => display_detailed_status(&session),
            "json" => println!("{}", session.export_json()?),
            "save" => match rest.first() {
                Some(path) => {
                    std::fs::write(path, session.export_json()?)?;
                    println!("Saved to {}.", path);
                }
                None => println!("Usage: save <path>"),
            },
            _ => println!("Unknown command. Type 'help' for the list."),
        }
    }

    println!("\nGoodbye! Stopped at t={}.", session.now());
    Ok(())
}

fn print_help() {
    println!();
    println!("Commands:");
    println!("  tick / t [min]            - Advance one step, or the given minutes");
    println!("  run <n>                   - Advance n steps");
    println!("  upgrade / u <building>    - Start a building upgrade");
    println!("  train <unit> <n>          - Train a batch of units");
    println!("  collect / c [resource]    - Move produced goods into storage");
    println!("  march / m <x> <y> <kind> <unit>=<n>... [delay=<min>]");
    println!("                            - Plan an expedition (raid/siege/conquer)");
    println!("  confirm <id>              - Send a planned expedition");
    println!("  cancel <id>               - Drop a planned expedition");
    println!("  resolve <id> [k=v]...     - Report loot (resource=n) and losses (unit=n)");
    println!("  world / w [radius]        - List nearby generated settlements");
    println!("  status / s                - Detailed settlement status");
    println!("  json / save <path>        - Print or save a snapshot");
    println!("  quit / q                  - Exit");
    println!();
}

fn parse_id(words: &[&str]) -> Option<ExpeditionId> {
    words
        .first()
        .map(|w| w.trim_start_matches('#'))
        .and_then(|w| w.parse::<u32>().ok())
        .map(ExpeditionId)
}

/// Timestamp a `tick [minutes]` command advances to, if it is representable
fn tick_target(now: Timestamp, minutes: Option<&str>, step: u64) -> Option<Timestamp> {
    let advance = match minutes {
        Some(m) => m.parse::<u64>().ok()?.checked_mul(MILLIS_PER_MINUTE)?,
        None => step,
    };
    now.checked_add(advance)
}

fn parse_pair(word: &str) -> Option<(&str, u32)> {
    let (key, value) = word.split_once('=')?;
    Some((key, value.parse().ok()?))
}

fn parse_march(words: &[&str]) -> std::result::Result<ExpeditionRequest, String> {
    let usage = "Usage: march <x> <y> <raid|siege|conquer> <unit>=<n>... [delay=<min>]";
    if words.len() < 4 {
        return Err(usage.to_string());
    }
    let x = words[0].parse::<i32>().map_err(|_| usage.to_string())?;
    let y = words[1].parse::<i32>().map_err(|_| usage.to_string())?;
    let kind = words[2].parse::<ExpeditionKind>()?;

    let mut army = Army::new();
    let mut delay = 0;
    for word in &words[3..] {
        let (key, value) = parse_pair(word).ok_or_else(|| usage.to_string())?;
        if key == "delay" {
            delay = value as u64 * MILLIS_PER_MINUTE;
            continue;
        }
        let unit = key.parse::<UnitType>().map_err(|e| format!("Unknown {}", e))?;
        let count = army.entry(unit).or_insert(0);
        *count = count.saturating_add(value);
    }
    Ok(ExpeditionRequest::new(TileCoord::new(x, y), army, kind).with_departure_offset(delay))
}

fn parse_outcome(words: &[&str]) -> std::result::Result<BattleOutcome, String> {
    let mut loot = Amounts::zero();
    let mut losses = Army::new();
    for word in words {
        let (key, value) =
            parse_pair(word).ok_or_else(|| format!("Expected key=value, got '{}'", word))?;
        if let Ok(resource) = key.parse::<ResourceType>() {
            loot[resource] += value as f64;
        } else if let Ok(unit) = key.parse::<UnitType>() {
            *losses.entry(unit).or_insert(0) += value;
        } else {
            return Err(format!("'{}' is neither a resource nor a unit", key));
        }
    }
    Ok(BattleOutcome::new(loot, losses))
}

fn print_events(events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::ResourcesAccrued { .. } => {}
            GameEvent::UpgradeCompleted {
                building, level, ..
            } => println!("  * {} reached level {}", building, level),
            GameEvent::TrainingCompleted { unit, quantity, .. } => {
                println!("  * {} {} ready", quantity, unit)
            }
            GameEvent::ExpeditionArrived { id } => {
                println!("  * {} arrived, waiting for a result", id)
            }
            GameEvent::ExpeditionReturning { id, loot } => {
                println!("  * {} returning with {}", id, loot)
            }
            GameEvent::ExpeditionCompleted { id, loot, losses } => println!(
                "  * {} home with {} ({} lost)",
                id,
                loot,
                losses.values().sum::<u32>()
            ),
        }
    }
}

/// Display a brief status line
fn display_status(session: &Session) {
    let Ok(home) = session.settlement(HOME_SETTLEMENT) else {
        println!("--- t={} | no settlement ---", session.now());
        return;
    };
    let ledger = &home.ledger;
    println!();
    println!(
        "--- t={} | {} | pop {}/{} | cap {} ---",
        session.now(),
        home.name,
        ledger.population_used(),
        ledger.population_cap,
        ledger.storage_capacity
    );
    println!("  Stored:      {}", ledger.stored);
    println!("  Uncollected: {}", ledger.uncollected);
}

/// Display buildings, queues and expeditions
fn display_detailed_status(session: &Session) {
    let Ok(home) = session.settlement(HOME_SETTLEMENT) else {
        return;
    };
    println!();
    println!("=== {} at {} ===", home.name, home.coord);
    println!("Hourly yield: {}", home.hourly_yield());

    println!("Buildings:");
    for (building, state) in &home.buildings {
        let next = if construction::can_start(&home, *building) {
            " (upgradable)"
        } else {
            ""
        };
        match state.upgrade {
            Some(order) => println!(
                "  {:<14} {:>2} -> {} at {}",
                building.name(),
                state.level,
                order.target_level,
                order.completes_at
            ),
            None => println!("  {:<14} {:>2}{}", building.name(), state.level, next),
        }
    }

    println!("Army:");
    for (unit, count) in &home.army {
        println!("  {:<14} {}", unit.name(), count);
    }
    for order in &home.training {
        println!(
            "  training {} {} until {}",
            order.quantity, order.unit, order.completes_at
        );
    }

    let expeditions = session.expeditions(None);
    if !expeditions.is_empty() {
        println!("Expeditions:");
    }
    for exp in expeditions {
        let when = match exp.status {
            ExpeditionStatus::Planning | ExpeditionStatus::Marching => {
                format!("arrives {}", exp.arrival_time)
            }
            ExpeditionStatus::Returning => {
                format!("home {}", exp.return_time.unwrap_or_default())
            }
            _ => String::new(),
        };
        println!(
            "  {} {} of {} units -> {} [{}] {}",
            exp.id,
            exp.kind,
            exp.size(),
            exp.target.info.name,
            exp.status,
            when
        );
    }
    println!();
}

fn display_world(session: &mut Session, radius: i32) {
    let Ok(home) = session.settlement(HOME_SETTLEMENT) else {
        return;
    };
    let mut nearby = session.world_around(home.coord, radius);
    nearby.sort_by(|a, b| {
        home.coord
            .distance(&a.coord())
            .total_cmp(&home.coord.distance(&b.coord()))
    });
    for s in nearby {
        println!(
            "  ({:>4}, {:>4}) {:<14} lvl {:>2} {:<8} {:.1} tiles",
            s.x,
            s.y,
            s.name,
            s.level,
            s.owner_name.as_deref().unwrap_or("-"),
            home.coord.distance(&s.coord())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_target() {
        assert_eq!(tick_target(1_000, None, 60_000), Some(61_000));
        assert_eq!(tick_target(0, Some("90"), 60_000), Some(90 * MILLIS_PER_MINUTE));
        assert_eq!(tick_target(0, Some("soon"), 60_000), None);
        let huge = u64::MAX.to_string();
        assert_eq!(tick_target(0, Some(huge.as_str()), 60_000), None);
        assert_eq!(tick_target(u64::MAX - 10, None, 60_000), None);
    }
}
