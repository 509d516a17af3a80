//! Named depth layers.
//!
//! Depth orders draw calls within a frame: lower values are painted first.
//! Each named layer is a multiple of 256 so callers can nudge an object
//! within its layer with [`offset`] without crossing into the next one.

/// Depth of layer `layer`.
pub const fn layer(layer: i8) -> i16 {
    layer as i16 * 256
}

/// Fractional nudge inside a layer. `offset(0.5)` is half a layer.
pub fn offset(offset: f64) -> i16 {
    (offset * 256.0) as i16
}

/// For arbitrary draws.
pub const DEFAULT: i16 = 0;

pub const BACKGROUND_2: i16 = layer(-100);
pub const BGO_BACK: i16 = layer(-95);
pub const SIZABLE_BLOCK: i16 = layer(-90);
pub const BGO: i16 = layer(-85);
pub const BGO_LOCK: i16 = layer(-80);
pub const NPC_BACK: i16 = layer(-75);
pub const BLOCK: i16 = layer(-65);
pub const EFFECT_BACK: i16 = layer(-60);
pub const NPC_COIN: i16 = layer(-55);
pub const NPC_ICED: i16 = layer(-50);
pub const NPC_NORMAL: i16 = layer(-45);
pub const CHAT_ICON: i16 = layer(-40);
pub const CLOWN_CAR: i16 = layer(-35);
pub const NPC_HELD: i16 = layer(-32);
pub const MOUNT: i16 = layer(-30);
pub const PLAYER: i16 = layer(-25);
pub const BGO_FRONT: i16 = layer(-20);
pub const NPC_FRONT: i16 = layer(-15);
pub const BLOCK_FRONT: i16 = layer(-10);
pub const EFFECT: i16 = layer(-5);
pub const PHYS: i16 = layer(-4);

pub const HUD: i16 = layer(5);
pub const NPC_DROPPED: i16 = layer(10);
pub const SCREEN_EFFECT: i16 = layer(15);
pub const UI: i16 = layer(20);
pub const META: i16 = layer(25);
pub const EDITOR_ITEM: i16 = layer(30);
pub const CURSOR: i16 = layer(35);
pub const TOUCHSCREEN_CONTROLLER: i16 = layer(40);

// world map
pub const WORLD_TILE: i16 = layer(-120);
pub const WORLD_SCENE: i16 = layer(-115);
pub const WORLD_PATH: i16 = layer(-110);
pub const WORLD_LEVEL: i16 = layer(-105);
pub const WORLD_MUSIC: i16 = layer(-100);
pub const WORLD_PLAYER: i16 = layer(-100);
pub const WORLD_EFFECT: i16 = layer(-90);
pub const WORLD_FRAME: i16 = layer(-75);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_are_ordered_back_to_front() {
        assert!(BACKGROUND_2 < BLOCK);
        assert!(BLOCK < NPC_NORMAL);
        assert!(NPC_NORMAL < PLAYER);
        assert!(PLAYER < HUD);
        assert!(HUD < CURSOR);
        assert_eq!(layer(-128), i16::MIN);
        assert!(PLAYER + offset(0.99) < BGO_FRONT);
    }
}
