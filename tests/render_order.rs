mod common;

use deferred_render::render::backend::{RenderTarget, SurfaceSize};
use deferred_render::render::backends::null::BackendOp;
use deferred_render::render::{depth, encode_angle, CallKind, CallRect, Color, Flip, RenderFeatures, Viewport};
use deferred_render::Sprite;

fn tags(journal: &deferred_render::render::backends::null::Journal) -> Vec<(i16, i16)> {
    journal.executed().into_iter().map(|(call, depth)| (call.dst.x, depth)).collect()
}

#[test]
fn flush_orders_by_depth_then_submission() {
    let (mut r, journal) = common::renderer();

    r.render_rect(1, 0, 4, 4, 5, Color::WHITE, true);
    r.render_rect(2, 0, 4, 4, -3, Color::WHITE, true);
    r.render_rect(3, 0, 4, 4, 5, Color::WHITE, true);
    r.render_rect(4, 0, 4, 4, 0, Color::WHITE, true);
    r.render_rect(5, 0, 4, 4, -3, Color::WHITE, true);
    assert!(journal.executed().is_empty());

    r.repaint();

    assert_eq!(tags(&journal), vec![(2, -3), (5, -3), (4, 0), (1, 5), (3, 5)]);
    assert_eq!(r.pending_calls(), 0);
    assert_eq!(journal.ops().last(), Some(&BackendOp::Present));
}

#[test]
fn layers_paint_back_to_front() {
    let (mut r, journal) = common::renderer();

    r.render_rect(1, 0, 4, 4, depth::HUD, Color::WHITE, true);
    r.render_rect(2, 0, 4, 4, depth::PLAYER, Color::WHITE, true);
    r.render_rect(3, 0, 4, 4, depth::BACKGROUND_2, Color::WHITE, true);
    r.flush_render_queue();

    let order: Vec<i16> = tags(&journal).into_iter().map(|(x, _)| x).collect();
    assert_eq!(order, vec![3, 2, 1]);
}

#[test]
fn direct_mode_executes_once_on_submission() {
    let (mut r, journal) = common::renderer();

    r.set_direct_mode(true);
    r.render_rect(7, 0, 4, 4, 100, Color::WHITE, true);
    assert!(r.is_direct_mode());
    assert_eq!(tags(&journal), vec![(7, 100)]);
    assert_eq!(r.pending_calls(), 0);

    r.repaint();
    assert_eq!(journal.executed().len(), 1);
    assert!(r.is_direct_mode());
}

#[test]
fn repaint_restores_queued_mode() {
    let (mut r, journal) = common::renderer();

    r.repaint();
    assert!(!r.is_direct_mode());

    r.render_rect(1, 0, 4, 4, 0, Color::WHITE, true);
    assert_eq!(r.pending_calls(), 1);
    assert!(journal.executed().is_empty());
}

#[test]
fn shake_offset_and_ignore() {
    let (mut r, journal) = common::renderer();

    r.offset_viewport(5, 5);
    r.render_rect(10, 10, 4, 4, 0, Color::WHITE, true);

    r.offset_viewport_ignore(true);
    assert_eq!(r.viewport_offset().effective(), (0, 0));
    r.render_rect(10, 10, 4, 4, 0, Color::WHITE, true);

    r.offset_viewport(7, 7);
    r.render_rect(10, 10, 4, 4, 0, Color::WHITE, true);

    r.offset_viewport_ignore(false);
    r.render_rect(10, 10, 4, 4, 0, Color::WHITE, true);
    r.flush_render_queue();

    let dst: Vec<(i16, i16)> = journal.executed().iter().map(|(c, _)| (c.dst.x, c.dst.y)).collect();
    assert_eq!(dst, vec![(15, 15), (10, 10), (10, 10), (17, 17)]);
}

#[test]
fn clearing_ignore_restores_the_parked_offset() {
    let (mut r, _journal) = common::renderer();

    r.offset_viewport(5, 5);
    r.offset_viewport_ignore(true);
    assert_eq!(r.viewport_offset().effective(), (0, 0));
    r.offset_viewport_ignore(false);
    assert_eq!(r.viewport_offset().effective(), (5, 5));
}

#[test]
fn viewport_change_flushes_first() {
    let (mut r, journal) = common::renderer();

    r.render_rect(1, 0, 4, 4, 100, Color::WHITE, true);
    r.set_viewport(10, 20, 100, 50);
    r.render_rect(2, 0, 4, 4, -100, Color::WHITE, true);
    r.reset_viewport();

    let ops = journal.ops();
    let clip = Viewport::new(10, 20, 100, 50);
    let first = ops.iter().position(|op| matches!(op, BackendOp::Execute { call, .. } if call.dst.x == 1)).unwrap();
    let set = ops.iter().position(|op| *op == BackendOp::Viewport(Some(clip))).unwrap();
    let second = ops.iter().position(|op| matches!(op, BackendOp::Execute { call, .. } if call.dst.x == 2)).unwrap();
    let reset = ops.iter().position(|op| *op == BackendOp::Viewport(None)).unwrap();

    assert!(first < set, "{ops:?}");
    assert!(set < second, "{ops:?}");
    assert!(second < reset, "{ops:?}");
    assert_eq!(r.viewport(), None);
}

#[test]
fn reset_viewport_drops_the_shake_offset() {
    let (mut r, journal) = common::renderer();

    r.offset_viewport(3, 4);
    r.offset_viewport_ignore(true);
    r.reset_viewport();

    assert_eq!(r.viewport_offset().effective(), (0, 0));
    assert_eq!(r.viewport_offset().carried(), (0, 0));
    assert!(!r.viewport_offset().is_ignored());
    assert!(journal.ops().contains(&BackendOp::UpdateWindow(SurfaceSize::new(320, 240))));
}

#[test]
fn target_switch_flushes_and_skips_when_current() {
    let (mut r, journal) = common::renderer();

    r.render_rect(1, 0, 4, 4, 0, Color::WHITE, true);
    r.set_target_texture();
    assert!(journal.ops().is_empty());

    r.set_target_screen();
    r.set_target_screen();

    let ops = journal.ops();
    assert_eq!(ops.len(), 2);
    assert!(matches!(ops[0], BackendOp::Execute { .. }));
    assert_eq!(ops[1], BackendOp::Target(RenderTarget::Screen));
    assert_eq!(r.render_target(), RenderTarget::Screen);
}

#[test]
fn blocked_repaint_does_nothing() {
    let (mut r, journal) = common::renderer();

    r.set_block_render(true);
    assert!(r.render_blocked());
    r.repaint();
    assert!(journal.ops().is_empty());

    r.set_block_render(false);
    r.repaint();
    assert!(journal.ops().contains(&BackendOp::Present));
}

#[test]
#[should_panic(expected = "rendering is blocked")]
fn drawing_while_blocked_panics() {
    let (mut r, _journal) = common::renderer();
    r.set_block_render(true);
    r.render_rect(0, 0, 1, 1, 0, Color::WHITE, true);
}

#[test]
#[should_panic(expected = "render queue overflow")]
fn too_many_calls_in_one_frame_panic() {
    let (mut r, _journal) = common::renderer();
    for _ in 0..=deferred_render::render::MAX_CALLS_PER_FRAME {
        r.render_rect(0, 0, 1, 1, 0, Color::WHITE, true);
    }
}

#[test]
fn shapes() {
    let (mut r, journal) = common::renderer();

    r.render_rect_br(10, 20, 15, 30, 0, Color::WHITE);
    r.render_circle(40, 40, 0, 0, Color::WHITE);
    r.render_circle(40, 40, -3, 0, Color::WHITE);
    r.render_circle(40, 40, 6, 0, Color::WHITE);
    r.render_circle_hole(60, 60, 4, 0, Color::WHITE);
    r.flush_render_queue();

    let calls: Vec<_> = journal.executed().into_iter().map(|(c, _)| c).collect();
    assert_eq!(calls.len(), 3);

    assert_eq!(calls[0].dst, CallRect::new(10, 20, 5, 10));
    assert!(calls[0].features.contains(RenderFeatures::FILLED));
    assert_eq!(calls[1].kind, CallKind::Circle { radius: 6 });
    assert_eq!((calls[1].dst.x, calls[1].dst.y), (40, 40));
    assert_eq!(calls[2].kind, CallKind::CircleHole { radius: 4 });
}

#[test]
fn sprite_features_follow_the_requested_form() {
    let (mut r, journal) = common::renderer();
    let id = r.lazy_load_picture_bytes(common::png_bytes(8, 4, [255, 0, 0, 255]), None, false);

    r.render_texture(id, 1.0, 1.0, 0, Color::WHITE);
    r.render_texture_part(id, 2.0, 2.0, 4.0, 4.0, 4, 0, 0, Color::WHITE);
    r.render_texture_scale(id, 3.0, 3.0, 16.0, 8.0, 0, Color::WHITE);
    r.render_sprite(Sprite::new(id, 4.4, 4.6).flip(Flip::HORIZONTAL).color(Color::rgb(1, 2, 3)));
    r.flush_render_queue();

    let calls: Vec<_> = journal.executed().into_iter().map(|(c, _)| c).collect();
    assert_eq!(calls.len(), 4);

    assert_eq!(calls[0].features, RenderFeatures::COLOR);
    assert_eq!(calls[0].dst, CallRect::new(1, 1, 8, 4));

    assert_eq!(calls[1].features, RenderFeatures::COLOR | RenderFeatures::SRC_RECT);
    assert!(matches!(calls[1].kind, CallKind::Sprite { src, .. } if src == CallRect::new(4, 0, 4, 4)));

    assert_eq!(calls[2].features, RenderFeatures::COLOR | RenderFeatures::SCALING);
    assert_eq!(calls[2].dst, CallRect::new(3, 3, 16, 8));

    assert_eq!(calls[3].flip(), Flip::HORIZONTAL);
    assert_eq!((calls[3].dst.x, calls[3].dst.y), (4, 5));
    assert_eq!(calls[3].color, Color::rgb(1, 2, 3));
}

#[test]
fn rotation_about_a_pivot_shifts_the_destination() {
    let (mut r, journal) = common::renderer();
    let id = r.lazy_load_picture_bytes(common::png_bytes(2, 2, [0, 0, 255, 255]), None, false);

    r.offset_viewport(100, 0);
    r.render_sprite(Sprite::new(id, 10.0, 10.0).rotate_around(90.0, 0.0, 0.0));
    r.render_sprite(Sprite::new(id, 10.0, 10.0).rotate(90.0));
    r.render_sprite(Sprite::new(id, 10.0, 10.0).rotate_around(0.0, 0.0, 0.0));
    r.flush_render_queue();

    let calls: Vec<_> = journal.executed().into_iter().map(|(c, _)| c).collect();
    assert_eq!(calls[0].dst, CallRect::new(108, 10, 2, 2));
    assert!(calls[0].features.contains(RenderFeatures::ROTATION));
    assert!(matches!(calls[0].kind, CallKind::Sprite { angle, .. } if angle == encode_angle(90.0)));

    assert_eq!(calls[1].dst, CallRect::new(110, 10, 2, 2));
    assert!(!calls[2].features.contains(RenderFeatures::ROTATION));
}

#[test]
fn broken_pictures_submit_nothing() {
    let (mut r, journal) = common::renderer();
    let id = r.lazy_load_picture_bytes(b"definitely not an image".to_vec(), None, false);

    r.render_texture(id, 0.0, 0.0, 0, Color::WHITE);
    assert_eq!(r.pending_calls(), 0);

    r.repaint();
    assert!(journal.executed().is_empty());
}
