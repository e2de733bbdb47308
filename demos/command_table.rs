//! Command Table Demonstration
//!
//! Builds a small interpreter command table on an `EntityRegistry`, caches
//! "compiled" scripts in an `AdaptiveCache`, and runs housekeeping over the
//! cache while printing the metrics both containers report.

use script_containers::clock::ManualClock;
use script_containers::config::{AdaptiveCacheConfig, HousekeepingConfig, TrimLimits};
use script_containers::entity::{FlagFilter, HasFlags, HasToken};
use script_containers::metrics::ContainerMetrics;
use script_containers::token::Token;
use script_containers::{AdaptiveCache, EntityRegistry, Housekeeping};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct CommandFlags: u32 {
        const CORE = 1 << 0;
        const SAFE = 1 << 1;
        const HIDDEN = 1 << 2;
    }
}

#[derive(Debug)]
struct Command {
    token: Token,
    flags: CommandFlags,
}

impl HasToken for Command {
    fn token(&self) -> Token {
        self.token
    }
}

impl HasFlags for Command {
    type Flags = CommandFlags;

    fn flags(&self) -> CommandFlags {
        self.flags
    }
}

fn main() {
    println!("Command table");
    println!("=============\n");

    let mut commands: EntityRegistry<String, Command> = EntityRegistry::new();
    let definitions = [
        ("puts", CommandFlags::CORE | CommandFlags::SAFE),
        ("set", CommandFlags::CORE | CommandFlags::SAFE),
        ("exec", CommandFlags::CORE),
        ("string", CommandFlags::CORE | CommandFlags::SAFE),
        ("__trace", CommandFlags::HIDDEN),
    ];
    for (name, flags) in definitions {
        let token = commands
            .add_new(name.to_string(), |token| Command { token, flags })
            .expect("command names are unique");
        println!("  defined {name:<8} token {token}");
    }

    let safe = FlagFilter {
        has: CommandFlags::SAFE,
        not_has: CommandFlags::HIDDEN,
        ..FlagFilter::any()
    };
    println!(
        "\nsafe commands: {:?}",
        commands.list(&safe, None, false).expect("no pattern")
    );
    println!(
        "commands matching s*: {}",
        commands.to_list_string(Some("s*"), false).expect("valid pattern")
    );

    let exec_token = commands.get("exec").expect("defined above").token();
    commands.rename("exec", "exec_unsafe".to_string());
    println!(
        "after rename, token {exec_token} still resolves: {}",
        commands.lookup_by_token(exec_token).is_some()
    );

    println!("\nScript cache");
    println!("============\n");

    let clock = ManualClock::new();
    let mut scripts: AdaptiveCache<String, usize> =
        AdaptiveCache::init(AdaptiveCacheConfig::default(), Some(Arc::new(clock.clone())));
    let mut housekeeping = Housekeeping::new(HousekeepingConfig {
        limits: TrimLimits {
            max_count: Some(6),
            min_access_count: Some(2),
            ..TrimLimits::UNBOUNDED
        },
        min_change_count: Some(25),
        max_change_count: Some(50),
        ..HousekeepingConfig::default()
    });

    for round in 0..3 {
        for i in 0..10 {
            let script = format!("proc p{i} {{}} {{ return {round} }}");
            if scripts.try_get(&script).is_none() {
                scripts.set(script, i);
            }
        }
        clock.advance(Duration::from_secs(61));

        let report = housekeeping.run(&mut scripts);
        println!(
            "  round {round}: trimmed {} (stage {:?}), advice {:?}, enabled {}",
            report.trim.removed, report.trim.stage, report.advice, report.enabled
        );
    }

    println!();
    display_metrics(&commands);
    display_metrics(&scripts);
}

fn display_metrics(container: &dyn ContainerMetrics) {
    let metrics: BTreeMap<String, f64> = container.metrics();
    println!("{} metrics:", container.container_name());
    for (name, value) in &metrics {
        println!("  {name:<20} {value:>10.2}");
    }
}
