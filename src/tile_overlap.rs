use std::ops::Range;

use crate::geom::Rect;
use crate::map::{MapTile, TileLayer};

/// The cells of a tile layer overlapped by a world-space rect. Cheap to copy, and
/// iterating it again restarts from the first cell.
#[derive(Copy, Clone, Debug)]
pub struct TileOverlap<'a> {
    layer: &'a TileLayer,
    start_x: u32,
    end_x: u32,
    start_y: u32,
    end_y: u32,
}

impl<'a> TileOverlap<'a> {
    pub fn new(layer: &'a TileLayer, tile_width: u32, tile_height: u32, bounds: &Rect) -> Self {
        let cell = |v: f32, size: u32, count: u32| -> u32 {
            let index = (v / size as f32).floor() as i64;
            index.max(0).min(count as i64) as u32
        };

        // right & bottom are extended by a cell so rects ending mid-cell include that cell
        let start_x = cell(bounds.left(), tile_width, layer.width);
        let end_x = cell(bounds.right() + tile_width as f32, tile_width, layer.width);
        let start_y = cell(bounds.top(), tile_height, layer.height);
        let end_y = cell(bounds.bottom() + tile_height as f32, tile_height, layer.height);

        TileOverlap {
            layer,
            start_x,
            end_x,
            start_y,
            end_y,
        }
    }

    pub fn x_range(&self) -> Range<u32> {
        self.start_x..self.end_x
    }

    pub fn y_range(&self) -> Range<u32> {
        self.start_y..self.end_y
    }

    pub fn len(&self) -> usize {
        self.x_range().len() * self.y_range().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> TileOverlapIter<'a> {
        TileOverlapIter {
            overlap: *self,
            x: self.start_x,
            y: self.start_y,
        }
    }
}

impl<'a> IntoIterator for TileOverlap<'a> {
    type Item = &'a MapTile;
    type IntoIter = TileOverlapIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &TileOverlap<'a> {
    type Item = &'a MapTile;
    type IntoIter = TileOverlapIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Row-major walk over a TileOverlap.
pub struct TileOverlapIter<'a> {
    overlap: TileOverlap<'a>,
    x: u32,
    y: u32,
}

impl<'a> Iterator for TileOverlapIter<'a> {
    type Item = &'a MapTile;

    fn next(&mut self) -> Option<Self::Item> {
        let o = &self.overlap;
        if o.start_x >= o.end_x {
            return None;
        }
        while self.y < o.end_y {
            if self.x < o.end_x {
                let tile = o.layer.tile(self.x, self.y);
                self.x += 1;
                return tile;
            }
            self.x = o.start_x;
            self.y += 1;
        }
        None
    }
}
