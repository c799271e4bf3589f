use anyhow::Result;
use cgmath::*;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use structopt::StructOpt;

use spacesim::collision::{LayerRange, TileMapCollision};
use spacesim::input::{ArrowKey, InputState};
use spacesim::map::Map;
use spacesim::player::Player;
use spacesim::sprite::player_sheet;

// ---------------------------------------------------------------------------------------------------------------------

/// Walks a player around a tile map without a window, applying tile and object collisions.
#[derive(StructOpt, Debug)]
struct Options {
    ///Map to load
    #[structopt(short, long, parse(from_os_str), default_value = "assets/test-map.tmx")]
    map: PathBuf,

    ///Number of simulation ticks to run
    #[structopt(short, long, default_value = "120")]
    ticks: u32,

    ///Seconds per tick
    #[structopt(long, default_value = "0.0166667")]
    dt: f32,

    ///Player start x, in pixels
    #[structopt(short, default_value = "128")]
    x: f32,

    ///Player start y (feet), in pixels
    #[structopt(short, default_value = "128")]
    y: f32,

    ///Arrow keys held for the whole run: left, right, up, down
    #[structopt(long)]
    hold: Vec<ArrowKey>,

    ///First layer to collide with
    #[structopt(long)]
    layer_start: Option<usize>,

    ///Number of layers to collide with
    #[structopt(long)]
    layer_count: Option<usize>,

    ///Index of the character on the character sheet
    #[structopt(short, long, default_value = "0")]
    character: i32,
}

// ---------------------------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opt = Options::from_args();

    let map = Rc::new(Map::new_tmx(&opt.map)?);
    log::info!(
        "Loaded {} ({}x{} px, {} layers)",
        opt.map.display(),
        map.width_in_pixels(),
        map.height_in_pixels(),
        map.layers.len()
    );

    let layer_range = match (opt.layer_start, opt.layer_count) {
        (None, None) => None,
        (start, count) => {
            let start = start.unwrap_or(0);
            let count = count.unwrap_or_else(|| map.layers.len().saturating_sub(start));
            Some(LayerRange::from_bounds(start..start + count, map.layers.len()))
        }
    };

    let mut collision = TileMapCollision::new(map.clone(), layer_range);
    let player = Rc::new(RefCell::new(Player::new(
        point2(opt.x, opt.y),
        player_sheet(opt.character),
    )));
    collision.add_actor(&player);

    let mut input = InputState::for_keys(&ArrowKey::ALL);
    for key in &opt.hold {
        input.process_key(*key, true);
    }

    let mut total_collisions = 0;
    for tick in 0..opt.ticks {
        player.borrow_mut().update(opt.dt, &input);
        let collisions = collision.update(opt.dt);
        if collisions > 0 {
            log::debug!(
                "tick {}: {} collisions, player at {:?}",
                tick,
                collisions,
                player.borrow().position
            );
        }
        total_collisions += collisions;
        input.update();
    }

    let player = player.borrow();
    log::info!(
        "{} ticks, {} collisions, facing {:?} ({:?})",
        opt.ticks,
        total_collisions,
        player.direction(),
        player.current_animation()
    );
    println!("{:.2} {:.2}", player.position.x, player.position.y);
    Ok(())
}
