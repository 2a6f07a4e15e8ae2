/// Liquid occupying a cell. `None` means the cell is dry; the codec stores
/// the liquid section only when a liquid is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LiquidType {
    #[default]
    None,
    Water,
    Lava,
    Honey,
    Shimmer,
}

/// Geometry variant of a foreground tile. Slopes cut away one corner, which
/// blocks the two cardinal faces forming that corner; half bricks occupy the
/// lower half of the cell and block the top face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BrickStyle {
    #[default]
    Full,
    HalfBrick,
    SlopeTopRight,
    SlopeTopLeft,
    SlopeBottomRight,
    SlopeBottomLeft,
}

impl BrickStyle {
    pub fn blocks_top(self) -> bool {
        matches!(
            self,
            BrickStyle::HalfBrick | BrickStyle::SlopeTopRight | BrickStyle::SlopeTopLeft
        )
    }

    pub fn blocks_left(self) -> bool {
        matches!(self, BrickStyle::SlopeTopLeft | BrickStyle::SlopeBottomLeft)
    }

    pub fn blocks_right(self) -> bool {
        matches!(
            self,
            BrickStyle::SlopeTopRight | BrickStyle::SlopeBottomRight
        )
    }

    pub fn blocks_bottom(self) -> bool {
        matches!(
            self,
            BrickStyle::SlopeBottomRight | BrickStyle::SlopeBottomLeft
        )
    }

    pub fn is_slope(self) -> bool {
        !matches!(self, BrickStyle::Full | BrickStyle::HalfBrick)
    }
}

/// One grid cell: foreground tile, background wall, liquid, wiring, paint
/// and geometry. Pure data; the codec and the framing engine do all the work.
///
/// `u`/`v` hold a stored sprite frame and are only meaningful when the tile
/// id is frame-important for the world's format version; `-1` means "no
/// stored frame" (the renderer recomputes it via the framing engine).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileRecord {
    pub is_active: bool,
    pub tile_type: u16,
    pub u: i16,
    pub v: i16,
    pub wall: u16,
    pub liquid: u8,
    pub liquid_type: LiquidType,
    pub wire_red: bool,
    pub wire_green: bool,
    pub wire_blue: bool,
    pub wire_yellow: bool,
    pub actuator: bool,
    pub in_active: bool,
    pub tile_color: u8,
    pub wall_color: u8,
    pub brick_style: BrickStyle,
}

impl Default for TileRecord {
    fn default() -> Self {
        Self {
            is_active: false,
            tile_type: 0,
            u: -1,
            v: -1,
            wall: 0,
            liquid: 0,
            liquid_type: LiquidType::None,
            wire_red: false,
            wire_green: false,
            wire_blue: false,
            wire_yellow: false,
            actuator: false,
            in_active: false,
            tile_color: 0,
            wall_color: 0,
            brick_style: BrickStyle::Full,
        }
    }
}

impl TileRecord {
    /// An active tile of the given type with no other attributes set.
    pub fn active(tile_type: u16) -> Self {
        Self {
            is_active: true,
            tile_type,
            ..Default::default()
        }
    }

    pub fn has_wall(&self) -> bool {
        self.wall != 0
    }

    pub fn has_liquid(&self) -> bool {
        self.liquid > 0 && self.liquid_type != LiquidType::None
    }

    pub fn has_wire(&self) -> bool {
        self.wire_red || self.wire_green || self.wire_blue || self.wire_yellow
    }
}
