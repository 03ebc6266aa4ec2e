// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated frame loop over a lit, shadowed, tiled scene.
//!
//! Builds a tiled floor, a depth-sorted actor layer, a shadow layer tracking
//! the hero, and a lighting layer with two torches, then runs 30 frames
//! through a [`PlanRenderer`](penumbra_render::PlanRenderer) with a
//! [`PrettyPrintSink`](penumbra_debug::pretty::PrettyPrintSink) attached.

use std::error::Error;

use kurbo::{Size, Vec2};
use penumbra_core::animator::{
    Easing, SheetAnimator, SheetEnd, SpriteSheet, Tween, TweenProperty,
};
use penumbra_core::backend::{ResourceManager, TextureHandle};
use penumbra_core::camera::Camera;
use penumbra_core::color::Color;
use penumbra_core::compositor::CompositorSpec;
use penumbra_core::context::Context;
use penumbra_core::grid::GridSpec;
use penumbra_core::target::Target;
use penumbra_core::trace::Tracer;
use penumbra_core::zorder::ZOrder;
use penumbra_render::{PlanRenderer, TexturePool};

use penumbra_debug::pretty::PrettyPrintSink;

const FRAME_COUNT: u64 = 30;
const SCREEN: Size = Size::new(320.0, 240.0);
const TILES: u32 = 48;
const HERO_WALK: SpriteSheet = SpriteSheet::new(4, 1);

fn main() -> Result<(), Box<dyn Error>> {
    // -- collaborators -----------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut renderer = PlanRenderer::new(SCREEN.width, SCREEN.height);
    let mut pool = TexturePool::new();
    pool.register("tile", 32, 32);
    pool.register("hero", 96, 24);
    pool.register("crate", 24, 24);
    pool.register("blob", 24, 12);
    pool.register("torch", 96, 96);

    let mut cx = Context::new();
    let scene = cx.scene_mut();
    let root = scene.root();

    // -- floor -------------------------------------------------------------
    let tiles = (0..TILES * TILES)
        .map(|_| pool.get_texture("tile"))
        .collect::<Result<Vec<TextureHandle>, _>>()?;
    let floor = scene.create_grid(GridSpec::uniform(TILES, TILES, 32.0), |scene, col, row| {
        scene.create_sprite(tiles[(row * TILES + col) as usize])
    })?;
    scene.add(root, floor)?;

    // -- actors ------------------------------------------------------------
    let actors = scene.create_zgroup(ZOrder::FLATTENED.with_refresh_interval(4));
    scene.add(root, actors)?;
    let hero = scene.create_sheet_sprite(pool.get_texture("hero")?, HERO_WALK);
    scene.add(actors, hero)?;
    scene.set_position(hero, Vec2::new(40.0, 100.0));
    scene.set_zindex(hero, 2.0);
    for (x, y, z) in [(80.0, 90.0, 1.0), (160.0, 100.0, 2.0), (240.0, 110.0, 3.0)] {
        let prop = scene.create_sprite(pool.get_texture("crate")?);
        scene.add(actors, prop)?;
        scene.set_position(prop, Vec2::new(x, y));
        scene.set_zindex(prop, z);
    }

    // -- shadows -----------------------------------------------------------
    let shadows = scene.create_shadow_layer(
        &mut pool,
        "shadow-map",
        320,
        240,
        CompositorSpec::SHADOW,
    )?;
    scene.add(root, shadows)?;
    let blob = scene.create_shadow(&mut pool, "blob", Color::new(0.0, 0.0, 0.0, 0.4))?;
    scene.add(shadows, blob)?;
    scene.track(blob, hero, Vec2::new(12.0, 24.0))?;

    // -- lighting ----------------------------------------------------------
    let lighting = scene.create_lighting_layer(
        &mut pool,
        "light-map",
        320,
        240,
        CompositorSpec::LIGHTING,
    )?;
    scene.add(root, lighting)?;
    scene.set_ambient_color(lighting, Color::rgb(0.15, 0.15, 0.25))?;
    let warm = scene.create_light(&mut pool, "torch", Color::rgb(1.0, 0.7, 0.4))?;
    let cold = scene.create_light(&mut pool, "torch", Color::rgb(0.4, 0.6, 1.0))?;
    scene.add(lighting, warm)?;
    scene.add(lighting, cold)?;
    scene.set_position(warm, Vec2::new(60.0, 80.0));
    scene.set_position(cold, Vec2::new(260.0, 160.0));

    // -- HUD ---------------------------------------------------------------
    let hud = scene.create_shape(Size::new(300.0, 12.0), true);
    scene.add(root, hud)?;
    scene.set_position(hud, Vec2::new(10.0, 220.0));
    scene.set_color(hud, Color::new(0.1, 0.1, 0.1, 0.8));
    scene.set_static(hud, true);

    // Canvas sizes drive the clear rectangles and in-layer culling.
    for layer in [shadows, lighting] {
        if let Some(c) = cx.scene().kind(layer).compositor() {
            renderer.register_texture(&c.canvas());
        }
    }

    // -- animation ---------------------------------------------------------
    let walk = Tween::new(
        hero,
        TweenProperty::Position {
            from: Vec2::new(40.0, 100.0),
            to: Vec2::new(280.0, 130.0),
        },
        0.4,
    )
    .with_easing(Easing::EaseInOut);
    cx.animators().register(walk);
    cx.animators()
        .register(SheetAnimator::new(hero, HERO_WALK, 0, 4, 8.0).with_end(SheetEnd::Repeat));
    cx.animators().register(Tween::new(
        cold,
        TweenProperty::Opacity { from: 1.0, to: 0.2 },
        0.25,
    ));

    // -- simulated loop ----------------------------------------------------
    let mut camera = Camera::default();
    for _ in 0..FRAME_COUNT {
        let mut tracer = Tracer::new(&mut pretty);
        cx.run_frame(&mut renderer, &mut pool, &camera, &mut tracer);

        // Keep the hero centered.
        let hero_at = cx.scene_mut().resolved(hero).position;
        camera.offset = hero_at - Vec2::new(SCREEN.width / 2.0, SCREEN.height / 2.0);
    }

    if let Some(plan) = renderer.last() {
        println!(
            "last frame: {} draws ({} on screen, {} offscreen), {} target pushes",
            plan.items.len(),
            plan.on(Target::Screen).count(),
            plan.offscreen_draws(),
            plan.pushes,
        );
    }

    // -- teardown ----------------------------------------------------------
    let released = cx.shutdown(&mut pool);
    println!(
        "released {released} texture references, {} textures still loaded",
        pool.len()
    );
    Ok(())
}
