//! Lossy Session Example
//!
//! Runs a predicting client and an authoritative server for the same player
//! over an in-memory link that delays, reorders, drops and duplicates
//! packets, then reports how far the two ended up apart.
//!
//! Usage: `lossy_session [demo.ron]`. `RUST_LOG` sets the filter, and
//! `LOG_FORMAT=json` switches to JSON output.

use serde::{Deserialize, Serialize};
use std::error::Error;
use stride_core::{FacingQuadrant, GroundPlane, InputSource, Vec3};
use stride_netcode::{EntityId, LinkConditions, LossyLink, Role, Session, StrideConfig, Transport};

const PLAYER: EntityId = 1;

/// Demo settings, all optional in the RON file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    session: StrideConfig,
    link: LinkConditions,
    ticks: u32,
    /// Server re-sends its latest snapshot every this many ticks
    replicate_every: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            session: StrideConfig::default(),
            link: LinkConditions {
                latency_ticks: 3,
                jitter_ticks: 4,
                drop_chance: 0.15,
                duplicate_chance: 0.1,
                seed: 2024,
            },
            ticks: 500,
            replicate_every: 10,
        }
    }
}

/// Walks a square, jumping at each corner, then stands still
struct SquareWalk {
    tick: u32,
}

impl InputSource for SquareWalk {
    fn sample_raw_axes(&mut self) -> (f32, f32) {
        match self.tick / 60 {
            0 => (0.0, 1.0),
            1 => (1.0, 0.0),
            2 => (0.0, -1.0),
            3 => (-1.0, 0.0),
            _ => (0.0, 0.0),
        }
    }

    fn sample_jump(&mut self) -> bool {
        self.tick < 240 && self.tick % 60 == 0
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

fn load_config() -> Result<DemoConfig, Box<dyn Error>> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(DemoConfig::default());
    };
    let content = std::fs::read_to_string(&path)?;
    let config: DemoConfig = ron::from_str(&content)?;
    config.session.validate()?;
    tracing::info!(%path, "loaded demo config");
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let config = load_config()?;

    let (link, client_end, server_end) = LossyLink::pair(config.link.clone())?;
    let mut client = Session::new(config.session.clone())?;
    let mut server = Session::new(config.session.clone())?;
    client.spawn(PLAYER, Role::Predicted, Vec3::ZERO)?;
    server.spawn(PLAYER, Role::Authority, Vec3::ZERO)?;

    let mut ground = GroundPlane::default();
    let mut input = SquareWalk { tick: 0 };
    let replicate_every = config.replicate_every.max(1);

    tracing::info!(
        ticks = config.ticks,
        latency = config.link.latency_ticks,
        jitter = config.link.jitter_ticks,
        drop = config.link.drop_chance,
        duplicate = config.link.duplicate_chance,
        "starting session"
    );

    for tick in 0..config.ticks {
        input.tick = tick;
        for packet in client.fixed_update(&mut input, FacingQuadrant::default(), &mut ground) {
            client_end.send_packet(&packet)?;
        }

        link.advance()?;

        for reply in server.pump(&server_end, &mut ground)? {
            server_end.send_packet(&reply)?;
        }
        if tick % replicate_every == 0 {
            for packet in server.replicate() {
                server_end.send_packet(&packet)?;
            }
        }
        client.pump(&client_end, &mut ground)?;

        if tick % 50 == 0 {
            if let (Some(predicted), Some(authoritative)) = (client.entity(PLAYER), server.entity(PLAYER)) {
                tracing::info!(
                    tick,
                    acknowledged = predicted.last_acknowledged_sequence(),
                    pending = predicted.control().map_or(0, |c| c.sequencer.pending_inputs()),
                    facing = ?predicted.facing(),
                    mirrored = predicted.facing().is_mirrored(),
                    lead = predicted.position().horizontal_distance(authoritative.position()),
                    "progress"
                );
            }
        }
    }

    let stats = link.stats()?;
    let client_pos = client.entity(PLAYER).map(|e| e.position()).unwrap_or_default();
    let server_pos = server.entity(PLAYER).map(|e| e.position()).unwrap_or_default();

    tracing::info!(
        sent = stats.sent,
        dropped = stats.dropped,
        duplicated = stats.duplicated,
        delivered = stats.delivered,
        "link totals"
    );
    println!("client position: {:?}", client_pos);
    println!("server position: {:?}", server_pos);
    println!(
        "divergence: {:.4} horizontal, {:.4} vertical",
        client_pos.horizontal_distance(server_pos),
        client_pos.vertical_distance(server_pos)
    );

    Ok(())
}
