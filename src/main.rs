use std::env;
use std::fs;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::info;

use scene_viewport::{InputState, MoveDirection, SceneTree, ViewportSession, ViewportSettings};

/// Fixed step used when simulating camera flight.
const FRAME_SECONDS: f32 = 1.0 / 60.0;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;

    let scene_xml = fs::read_to_string(&options.scene_path)
        .with_context(|| format!("unable to read {}", options.scene_path))?;
    let scene = SceneTree::from_xml(&scene_xml).context("failed to parse scene XML")?;

    let settings = match &options.settings_path {
        Some(path) => {
            let xml = fs::read_to_string(path)
                .with_context(|| format!("unable to read {path}"))?;
            ViewportSettings::from_xml(&xml).context("failed to parse viewport settings")?
        }
        None => ViewportSettings::default(),
    };

    println!("Loaded scene with {} nodes", scene.len() - 1);
    for (id, node) in scene.iter().skip(1) {
        let name = scene.full_name(id).unwrap_or_default();
        println!(" - {} ({})", name, node.object.object_type);
    }

    let input = Arc::new(InputState::new());
    let mut session = ViewportSession::new(scene, settings, Arc::clone(&input), options.size);
    let center = session.rect().size() * 0.5;

    if let Some((direction, seconds)) = options.fly {
        let bindings = session.settings().bindings;
        input.set_mouse_position(center);
        input.set_binding(bindings.activate, true);
        input.set_binding(bindings.movement(direction), true);

        let frames = (seconds / FRAME_SECONDS).round() as u32;
        info!("flying {} for {frames} frame(s)", direction.name());
        for _ in 0..frames {
            session.frame(FRAME_SECONDS)?;
        }

        input.set_binding(bindings.movement(direction), false);
        input.set_binding(bindings.activate, false);
        session.frame(FRAME_SECONDS)?;

        let position = session.camera_transform().position;
        println!(
            "Camera position: ({:.2}, {:.2}, {:.2})",
            position.x, position.y, position.z
        );
    }

    if let Some(pointer) = options.pick {
        let result = session.pick_at(pointer)?;
        match result.node.and_then(|node| session.scene().full_name(node)) {
            Some(name) => println!("Picked {name} at {:.2}", result.distance),
            None => println!("Picked nothing"),
        }
    }

    Ok(())
}

struct CliOptions {
    scene_path: String,
    settings_path: Option<String>,
    size: Vec2,
    fly: Option<(MoveDirection, f32)>,
    pick: Option<Vec2>,
}

const USAGE: &str = "Usage: scene-viewport <scene.xml> [--settings <viewport.xml>] \
[--size <w>x<h>] [--fly <direction> <seconds>] [--pick <x> <y>]";

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let Some(scene_path) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        let mut options = Self {
            scene_path,
            settings_path: None,
            size: Vec2::new(1280.0, 720.0),
            fly: None,
            pick: None,
        };

        while let Some(arg) = args.next() {
            let mut value = |what: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{arg} expects {what}. {USAGE}"))
            };
            match arg.as_str() {
                "--settings" => options.settings_path = Some(value("a path")?),
                "--size" => options.size = parse_size(&value("<w>x<h>")?)?,
                "--fly" => {
                    let name = value("a direction")?;
                    let direction = MoveDirection::from_name(&name)
                        .ok_or_else(|| anyhow!("unknown direction {name:?}"))?;
                    let seconds = parse_number(&value("seconds")?)?;
                    if !seconds.is_finite() || seconds < 0.0 {
                        return Err(anyhow!("flight time must be non-negative, got {seconds}"));
                    }
                    options.fly = Some((direction, seconds));
                }
                "--pick" => {
                    let x = parse_number(&value("x and y")?)?;
                    let y = parse_number(&value("x and y")?)?;
                    options.pick = Some(Vec2::new(x, y));
                }
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
            }
        }

        Ok(options)
    }
}

fn parse_number(value: &str) -> Result<f32> {
    value
        .parse::<f32>()
        .map_err(|err| anyhow!("failed to parse number {value:?}: {err}"))
}

fn parse_size(value: &str) -> Result<Vec2> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| anyhow!("size must look like 1280x720, got {value:?}"))?;
    let size = Vec2::new(parse_number(width)?, parse_number(height)?);
    if size.x <= 0.0 || size.y <= 0.0 {
        return Err(anyhow!("size must be positive, got {value:?}"));
    }
    Ok(size)
}
