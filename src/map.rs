use anyhow::{Context, Result};
use cgmath::*;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use xml::reader::{EventReader, XmlEvent};

use crate::constants::{
    FLIPPED_DIAGONALLY_FLAG, FLIPPED_HORIZONTALLY_FLAG, FLIPPED_VERTICALLY_FLAG,
};
use crate::geom::{BoundsShape, Circle, Rect};
use crate::tileset::{self, parse_attr};

// ---------------------------------------------------------------------------------------------------------------------

/// One cell of a tile layer. A gid of zero marks an empty cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MapTile {
    pub gid: u32,
    pub flipped_horizontally: bool,
    pub flipped_vertically: bool,
    pub flipped_diagonally: bool,
    /// Grid position, in cells
    pub x: u32,
    pub y: u32,
}

impl MapTile {
    /// Decodes a raw tmx tile value, splitting the flip bits from the gid.
    pub fn from_raw(raw: u32, x: u32, y: u32) -> Self {
        MapTile {
            gid: raw
                & !(FLIPPED_HORIZONTALLY_FLAG | FLIPPED_VERTICALLY_FLAG | FLIPPED_DIAGONALLY_FLAG),
            flipped_horizontally: raw & FLIPPED_HORIZONTALLY_FLAG != 0,
            flipped_vertically: raw & FLIPPED_VERTICALLY_FLAG != 0,
            flipped_diagonally: raw & FLIPPED_DIAGONALLY_FLAG != 0,
            x,
            y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.gid == 0
    }
}

#[derive(Clone, Debug)]
pub struct TileLayer {
    pub id: i32,
    pub name: String,
    pub width: u32,  // tiles wide
    pub height: u32, // tiles tall
    pub tiles: Vec<MapTile>,
}

impl TileLayer {
    /// Builds a layer from raw row-major tile values (flip bits included).
    pub fn from_raw(id: i32, name: &str, width: u32, height: u32, raw: &[u32]) -> Result<Self> {
        let expected_count = width as usize * height as usize;
        if raw.len() != expected_count {
            anyhow::bail!(
                "Expected layer \"{}\" tile data to have {} entries, but got {}",
                name,
                expected_count,
                raw.len()
            );
        }

        let tiles = raw
            .iter()
            .enumerate()
            .map(|(i, r)| MapTile::from_raw(*r, i as u32 % width, i as u32 / width))
            .collect();

        Ok(TileLayer {
            id,
            name: name.to_string(),
            width,
            height,
            tiles,
        })
    }

    pub fn tile(&self, x: u32, y: u32) -> Option<&MapTile> {
        if x < self.width && y < self.height {
            self.tiles.get((x + y * self.width) as usize)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub enum ObjectKind {
    Rectangle,
    Ellipse,
    Point,
    Polygon(Vec<Point2<f32>>),
    Polyline(Vec<Point2<f32>>),
    /// A tile placed as an object; holds the raw gid, flip bits included
    Tile(u32),
    Text,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    pub kind: ObjectKind,
    /// Top-left in world pixels
    pub position: Point2<f32>,
    pub size: Vector2<f32>,
}

impl MapObject {
    pub fn new(id: u32, kind: ObjectKind, position: Point2<f32>, size: Vector2<f32>) -> Self {
        MapObject {
            id,
            name: String::new(),
            kind,
            position,
            size,
        }
    }

    /// The collision shape for this object, if it has one. Ellipses collide as a circle
    /// centered on the object's position with a radius of its width. Points, polygons,
    /// polylines, tile objects and text don't collide.
    pub fn bounds(&self) -> Option<BoundsShape> {
        match self.kind {
            ObjectKind::Rectangle => Some(Rect::new(self.position, self.size).into()),
            ObjectKind::Ellipse => Some(Circle::new(self.position, self.size.x).into()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ObjectLayer {
    pub id: i32,
    pub name: String,
    pub objects: Vec<MapObject>,
}

#[derive(Clone, Debug)]
pub enum Layer {
    Tiles(TileLayer),
    Objects(ObjectLayer),
}

impl Layer {
    pub fn name(&self) -> &str {
        match self {
            Layer::Tiles(l) => &l.name,
            Layer::Objects(l) => &l.name,
        }
    }
}

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Debug)]
pub struct MapTileSet {
    pub first_gid: u32,
    pub tileset: tileset::TileSet,
}

#[derive(Debug)]
pub struct Map {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub layers: Vec<Layer>,
    /// Sorted by first_gid
    pub tilesets: Vec<MapTileSet>,
}

impl Map {
    pub fn new(width: u32, height: u32, tile_width: u32, tile_height: u32) -> Self {
        Map {
            width,
            height,
            tile_width,
            tile_height,
            layers: Vec::new(),
            tilesets: Vec::new(),
        }
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn with_tileset(mut self, first_gid: u32, tileset: tileset::TileSet) -> Self {
        self.add_tileset(first_gid, tileset);
        self
    }

    fn add_tileset(&mut self, first_gid: u32, tileset: tileset::TileSet) {
        let index = self
            .tilesets
            .iter()
            .position(|t| t.first_gid > first_gid)
            .unwrap_or_else(|| self.tilesets.len());
        self.tilesets.insert(index, MapTileSet { first_gid, tileset });
    }

    pub fn width_in_pixels(&self) -> u32 {
        self.width * self.tile_width
    }

    pub fn height_in_pixels(&self) -> u32 {
        self.height * self.tile_height
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_xywh(
            0.0,
            0.0,
            self.width_in_pixels() as f32,
            self.height_in_pixels() as f32,
        )
    }

    /// Finds the tileset owning a gid, returning it with its first gid. The local id
    /// of the tile within that tileset is `gid - first_gid`.
    pub fn tileset_for_gid(&self, gid: u32) -> Option<(&tileset::TileSet, u32)> {
        if gid == 0 {
            return None;
        }
        let entry = self.tilesets.iter().rev().find(|t| t.first_gid <= gid)?;
        let local_id = gid - entry.first_gid;
        if entry.tileset.tile_count > 0 && local_id >= entry.tileset.tile_count {
            return None;
        }
        Some((&entry.tileset, entry.first_gid))
    }

    pub fn layer_named(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name() == name)
    }

    pub fn object_layers(&self) -> impl Iterator<Item = &ObjectLayer> {
        self.layers.iter().filter_map(|l| match l {
            Layer::Objects(o) => Some(o),
            _ => None,
        })
    }

    pub fn new_tmx(tmx_file: &Path) -> Result<Self> {
        let parent_dir = tmx_file
            .parent()
            .context("Expect tmx_file to have parent dir")?;
        let file = File::open(tmx_file)
            .with_context(|| format!("Unable to open {}", tmx_file.display()))?;
        let map = Self::from_reader(BufReader::new(file), parent_dir)
            .with_context(|| format!("Unable to parse map {}", tmx_file.display()))?;

        log::debug!(
            "Loaded map {} - {}x{} tiles of {}x{} px, {} layers, {} tilesets",
            tmx_file.display(),
            map.width,
            map.height,
            map.tile_width,
            map.tile_height,
            map.layers.len(),
            map.tilesets.len()
        );
        Ok(map)
    }

    /// Parses tmx from a reader. External tilesets are resolved relative to `base_dir`.
    pub fn from_reader<R: Read>(reader: R, base_dir: &Path) -> Result<Self> {
        let mut events = EventReader::new(reader).into_iter();

        let mut width: Option<u32> = None;
        let mut height: Option<u32> = None;
        let mut tile_width: Option<u32> = None;
        let mut tile_height: Option<u32> = None;
        let mut tilesets: Vec<(u32, tileset::TileSet)> = vec![];
        let mut layers: Vec<Layer> = vec![];

        // tile layer being read: (id, name, width, height, raw tile data)
        let mut current_tile_layer: Option<(i32, String, u32, u32, Vec<u32>)> = None;
        let mut handle_current_layer_data = false;
        let mut current_object_layer: Option<ObjectLayer> = None;
        let mut current_object: Option<MapObject> = None;

        while let Some(e) = events.next() {
            match e.context("Malformed tmx xml")? {
                XmlEvent::StartElement {
                    name, attributes, ..
                } => match name.local_name.as_str() {
                    //
                    // Handle the <map> block
                    //
                    "map" => {
                        for attr in &attributes {
                            match attr.name.local_name.as_str() {
                                "width" => width = Some(parse_attr(attr, "map")?),
                                "height" => height = Some(parse_attr(attr, "map")?),
                                "tilewidth" => tile_width = Some(parse_attr(attr, "map")?),
                                "tileheight" => tile_height = Some(parse_attr(attr, "map")?),
                                _ => {}
                            }
                        }
                    }

                    //
                    // Handle the <tileset> block, either a reference to a tsx or embedded
                    //
                    "tileset" => {
                        let mut first_gid: Option<u32> = None;
                        let mut source: Option<String> = None;
                        for attr in &attributes {
                            match attr.name.local_name.as_str() {
                                "firstgid" => first_gid = Some(parse_attr(attr, "tileset")?),
                                "source" => source = Some(attr.value.clone()),
                                _ => {}
                            }
                        }
                        let first_gid = first_gid
                            .context("Expected to read 'firstgid' attr on <tileset> block")?;

                        let tileset = match source {
                            Some(source) => {
                                let tileset_path = base_dir.join(source);
                                tileset::TileSet::new_tsx(&tileset_path).with_context(|| {
                                    format!(
                                        "Expected to load referenced <tileset> from {}",
                                        tileset_path.display()
                                    )
                                })?
                            }
                            None => tileset::TileSet::parse_element(&attributes, &mut events)
                                .context("Expected to parse embedded <tileset>")?,
                        };
                        tilesets.push((first_gid, tileset));
                    }

                    //
                    // Handle the <layer> block - assigns current_tile_layer
                    //
                    "layer" => {
                        let mut id: Option<i32> = None;
                        let mut layer_name = String::new();
                        let mut layer_width: Option<u32> = None;
                        let mut layer_height: Option<u32> = None;
                        for attr in &attributes {
                            match attr.name.local_name.as_str() {
                                "id" => id = Some(parse_attr(attr, "layer")?),
                                "name" => layer_name = attr.value.clone(),
                                "width" => layer_width = Some(parse_attr(attr, "layer")?),
                                "height" => layer_height = Some(parse_attr(attr, "layer")?),
                                _ => {}
                            }
                        }
                        current_tile_layer = Some((
                            id.context("<layer> element missing an 'id' attribute.")?,
                            layer_name,
                            layer_width.context("<layer> element missing a 'width' attribute.")?,
                            layer_height
                                .context("<layer> element missing a 'height' attribute.")?,
                            vec![],
                        ));
                    }

                    //
                    // Handle the <data> block - requires that current_tile_layer is Some
                    //
                    "data" => {
                        handle_current_layer_data = attributes
                            .iter()
                            .any(|a| a.name.local_name == "encoding" && a.value == "csv");
                        if !handle_current_layer_data {
                            anyhow::bail!("Only supported encoding for <data> block is 'csv'");
                        }
                    }

                    //
                    // Handle <objectgroup> and its <object> children
                    //
                    "objectgroup" => {
                        let mut layer = ObjectLayer::default();
                        for attr in &attributes {
                            match attr.name.local_name.as_str() {
                                "id" => layer.id = parse_attr(attr, "objectgroup")?,
                                "name" => layer.name = attr.value.clone(),
                                _ => {}
                            }
                        }
                        current_object_layer = Some(layer);
                    }
                    "object" => {
                        let mut object = MapObject::new(
                            0,
                            ObjectKind::Rectangle,
                            point2(0.0, 0.0),
                            vec2(0.0, 0.0),
                        );
                        for attr in &attributes {
                            match attr.name.local_name.as_str() {
                                "id" => object.id = parse_attr(attr, "object")?,
                                "name" => object.name = attr.value.clone(),
                                "x" => object.position.x = parse_attr(attr, "object")?,
                                "y" => object.position.y = parse_attr(attr, "object")?,
                                "width" => object.size.x = parse_attr(attr, "object")?,
                                "height" => object.size.y = parse_attr(attr, "object")?,
                                "gid" => {
                                    object.kind = ObjectKind::Tile(parse_attr(attr, "object")?)
                                }
                                _ => {}
                            }
                        }
                        current_object = Some(object);
                    }
                    "text" => {
                        current_object
                            .as_mut()
                            .context("Encountered <text> outside of an <object>")?
                            .kind = ObjectKind::Text;
                    }
                    "ellipse" | "point" | "polygon" | "polyline" => {
                        let object = current_object.as_mut().with_context(|| {
                            format!("Encountered <{}> outside of an <object>", name.local_name)
                        })?;
                        object.kind = match name.local_name.as_str() {
                            "ellipse" => ObjectKind::Ellipse,
                            "point" => ObjectKind::Point,
                            shape => {
                                let points = attributes
                                    .iter()
                                    .find(|a| a.name.local_name == "points")
                                    .with_context(|| {
                                        format!("Expected <{}> to have a 'points' attr", shape)
                                    })?;
                                let points = parse_points(&points.value)?;
                                if shape == "polygon" {
                                    ObjectKind::Polygon(points)
                                } else {
                                    ObjectKind::Polyline(points)
                                }
                            }
                        };
                    }
                    _ => {}
                },
                XmlEvent::Characters(characters) if handle_current_layer_data => {
                    let (_, _, _, _, data) = current_tile_layer.as_mut().context(
                        "Entered a <data> character section without having an active layer.",
                    )?;
                    for index in characters.split(',') {
                        let index = index.trim();
                        if !index.is_empty() {
                            let index = index.parse::<u32>().with_context(|| {
                                format!("Expected to parse '{}' to u32", index)
                            })?;
                            data.push(index);
                        }
                    }
                }
                XmlEvent::EndElement { name } => match name.local_name.as_str() {
                    "data" => handle_current_layer_data = false,
                    "layer" => {
                        let (id, layer_name, layer_width, layer_height, data) =
                            current_tile_layer.take().context(
                                "Expected current_tile_layer to have been populated when finishing <layer> block.",
                            )?;
                        layers.push(Layer::Tiles(TileLayer::from_raw(
                            id,
                            &layer_name,
                            layer_width,
                            layer_height,
                            &data,
                        )?));
                    }
                    "object" => {
                        let object = current_object
                            .take()
                            .context("Expected an <object> when reaching </object>")?;
                        current_object_layer
                            .as_mut()
                            .context("Encountered <object> outside of an <objectgroup>")?
                            .objects
                            .push(object);
                    }
                    "objectgroup" => {
                        let layer = current_object_layer
                            .take()
                            .context("Expected an <objectgroup> when reaching </objectgroup>")?;
                        layers.push(Layer::Objects(layer));
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        // verify all required fields were loaded
        let width = width.context("Expected to read width attribute on <map>")?;
        let height = height.context("Expected to read height attribute on <map>")?;
        let tile_width = tile_width.context("Expected to read tilewidth attribute on <map>")?;
        let tile_height = tile_height.context("Expected to read tileheight attribute on <map>")?;

        let mut map = Map::new(width, height, tile_width, tile_height);
        map.layers = layers;
        for (first_gid, tileset) in tilesets {
            map.add_tileset(first_gid, tileset);
        }
        Ok(map)
    }
}

/// Parses a tmx point list, e.g. "0,0 32,0 32,16"
fn parse_points(points: &str) -> Result<Vec<Point2<f32>>> {
    points
        .split_whitespace()
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .with_context(|| format!("Expected \"x,y\" point, got \"{}\"", pair))?;
            let x = x
                .parse::<f32>()
                .with_context(|| format!("Expected to parse '{}' to f32", x))?;
            let y = y
                .parse::<f32>()
                .with_context(|| format!("Expected to parse '{}' to f32", y))?;
            Ok(point2(x, y))
        })
        .collect()
}

#[cfg(test)]
mod map_tests {
    use super::*;
    use crate::collision::TileMapCollision;
    use std::path::PathBuf;
    use std::rc::Rc;

    const TMX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.5" orientation="orthogonal" width="4" height="3" tilewidth="32" tileheight="32">
 <tileset firstgid="1" name="walls" tilewidth="32" tileheight="32" tilecount="4" columns="2">
  <tile id="0">
   <objectgroup draworder="index" id="2">
    <object id="1" x="0" y="0" width="32" height="32"/>
   </objectgroup>
  </tile>
 </tileset>
 <tileset firstgid="5" name="props" tilewidth="16" tileheight="16" tilecount="2" columns="2">
  <tile id="1">
   <properties>
    <property name="kind" value="crate"/>
   </properties>
  </tile>
 </tileset>
 <layer id="1" name="ground" width="4" height="3">
  <data encoding="csv">
1,0,0,2147483649,
0,6,0,0,
1073741825,0,536870913,1
</data>
 </layer>
 <objectgroup id="2" name="objects">
  <object id="3" name="rock" x="64" y="32" width="16" height="8"/>
  <object id="4" x="100" y="50" width="10" height="10">
   <ellipse/>
  </object>
  <object id="5" x="10" y="10">
   <polygon points="0,0 16,0 16,16"/>
  </object>
  <object id="6" x="1" y="2">
   <point/>
  </object>
 </objectgroup>
</map>
"#;

    fn load() -> Map {
        Map::from_reader(TMX.as_bytes(), Path::new(".")).unwrap()
    }

    #[test]
    fn loads_map_dimensions() {
        let map = load();
        assert_eq!(map.width, 4);
        assert_eq!(map.height, 3);
        assert_eq!(map.tile_width, 32);
        assert_eq!(map.tile_height, 32);
        assert_eq!(map.width_in_pixels(), 128);
        assert_eq!(map.height_in_pixels(), 96);
        assert_eq!(map.layers.len(), 2);
        assert_eq!(map.tilesets.len(), 2);
    }

    #[test]
    fn decodes_tile_layer_and_flip_bits() {
        let map = load();
        let layer = match map.layer_named("ground") {
            Some(Layer::Tiles(layer)) => layer,
            other => panic!("Expected ground tile layer, got {:?}", other),
        };
        assert_eq!(layer.tiles.len(), 12);

        let t = layer.tile(0, 0).unwrap();
        assert_eq!(t.gid, 1);
        assert!(!t.flipped_horizontally && !t.flipped_vertically && !t.flipped_diagonally);

        assert!(layer.tile(1, 0).unwrap().is_empty());

        let t = layer.tile(3, 0).unwrap();
        assert_eq!(t.gid, 1);
        assert!(t.flipped_horizontally);
        assert!(!t.flipped_vertically);

        let t = layer.tile(0, 2).unwrap();
        assert_eq!((t.gid, t.x, t.y), (1, 0, 2));
        assert!(t.flipped_vertically);

        let t = layer.tile(2, 2).unwrap();
        assert_eq!(t.gid, 1);
        assert!(t.flipped_diagonally);

        assert!(layer.tile(4, 0).is_none());
        assert!(layer.tile(0, 3).is_none());
    }

    #[test]
    fn resolves_tilesets_by_gid() {
        let map = load();
        assert!(map.tileset_for_gid(0).is_none());

        let (tileset, first_gid) = map.tileset_for_gid(1).unwrap();
        assert_eq!((tileset.name.as_str(), first_gid), ("walls", 1));
        assert_eq!(tileset.tile(1 - first_gid).unwrap().objects.len(), 1);

        // gid 2 belongs to walls but has no tile record
        let (tileset, first_gid) = map.tileset_for_gid(2).unwrap();
        assert!(tileset.tile(2 - first_gid).is_none());

        let (tileset, first_gid) = map.tileset_for_gid(6).unwrap();
        assert_eq!((tileset.name.as_str(), first_gid), ("props", 5));
        assert_eq!(
            tileset.tile(6 - first_gid).unwrap().get_property("kind"),
            Some("crate")
        );

        // past the end of the last tileset
        assert!(map.tileset_for_gid(7).is_none());
    }

    #[test]
    fn loads_object_layer() {
        let map = load();
        let objects: Vec<&MapObject> = map.object_layers().flat_map(|l| &l.objects).collect();
        assert_eq!(objects.len(), 4);

        assert_eq!(objects[0].name, "rock");
        assert_eq!(objects[0].kind, ObjectKind::Rectangle);
        assert_eq!(
            objects[0].bounds(),
            Some(BoundsShape::Rect(Rect::from_xywh(64.0, 32.0, 16.0, 8.0)))
        );

        assert_eq!(objects[1].kind, ObjectKind::Ellipse);
        assert_eq!(
            objects[1].bounds(),
            Some(BoundsShape::Circle(Circle::new(point2(100.0, 50.0), 10.0)))
        );

        assert_eq!(
            objects[2].kind,
            ObjectKind::Polygon(vec![point2(0.0, 0.0), point2(16.0, 0.0), point2(16.0, 16.0)])
        );
        assert!(objects[2].bounds().is_none());

        assert_eq!(objects[3].kind, ObjectKind::Point);
        assert!(objects[3].bounds().is_none());
    }

    #[test]
    fn tile_and_text_objects_have_no_bounds() {
        let tmx = r#"<map width="4" height="4" tilewidth="32" tileheight="32">
 <objectgroup id="1" name="decor">
  <object id="1" gid="5" x="0" y="32" width="32" height="32"/>
  <object id="2" name="sign" x="0" y="0" width="40" height="10">
   <text wrap="1">hi</text>
  </object>
 </objectgroup>
</map>"#;
        let map = Map::from_reader(tmx.as_bytes(), Path::new(".")).unwrap();
        let objects: Vec<&MapObject> = map.object_layers().flat_map(|l| &l.objects).collect();
        assert_eq!(objects.len(), 2);

        assert_eq!(objects[0].kind, ObjectKind::Tile(5));
        assert!(objects[0].bounds().is_none());

        assert_eq!(objects[1].name, "sign");
        assert_eq!(objects[1].kind, ObjectKind::Text);
        assert_eq!(objects[1].size, vec2(40.0, 10.0));
        assert!(objects[1].bounds().is_none());

        let collision = TileMapCollision::new(Rc::new(map), None);
        assert_eq!(collision.objects().map(|tree| tree.len()), Some(0));
    }

    #[test]
    fn rejects_non_csv_data() {
        let tmx = r#"<map width="1" height="1" tilewidth="32" tileheight="32">
 <layer id="1" name="l" width="1" height="1"><data encoding="base64">AQAAAA==</data></layer>
</map>"#;
        assert!(Map::from_reader(tmx.as_bytes(), Path::new(".")).is_err());
    }

    #[test]
    fn rejects_short_tile_data() {
        let tmx = r#"<map width="2" height="1" tilewidth="32" tileheight="32">
 <layer id="1" name="l" width="2" height="1"><data encoding="csv">1</data></layer>
</map>"#;
        assert!(Map::from_reader(tmx.as_bytes(), Path::new(".")).is_err());
    }

    #[test]
    fn loads_asset_map_with_external_tileset() {
        let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "assets", "test-map.tmx"]
            .iter()
            .collect();
        let map = Map::new_tmx(&path).unwrap();
        assert_eq!(map.tilesets.len(), 1);
        assert_eq!(map.tilesets[0].tileset.name, "test-tileset");
        let (tileset, first_gid) = map.tileset_for_gid(1).unwrap();
        assert_eq!(first_gid, 1);
        assert!(!tileset.tile(0).unwrap().objects.is_empty());
        assert!(map.object_layers().count() > 0);
    }
}
