use anyhow::{Context, Result};
use cgmath::*;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;
use xml::attribute::OwnedAttribute;
use xml::reader::{EventReader, Events, XmlEvent};

use crate::geom::Rect;

/// Parses an xml attribute's value, with a useful error message on failure.
pub(crate) fn parse_attr<T>(attr: &OwnedAttribute, element: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    attr.value.parse::<T>().with_context(|| {
        format!(
            "Expected to parse '{}' attr of <{}>, got \"{}\"",
            attr.name.local_name, element, attr.value
        )
    })
}

/// A collision rectangle attached to a tile, in tile-local pixel space.
#[derive(Clone, Debug, PartialEq)]
pub struct TileObject {
    pub id: u32,
    pub origin: Point2<f32>,
    pub extent: Vector2<f32>,
}

impl TileObject {
    pub fn new(id: u32, origin: Point2<f32>, extent: Vector2<f32>) -> Self {
        Self { id, origin, extent }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.origin, self.extent)
    }
}

#[derive(Clone, Debug)]
pub struct TilesetTile {
    /// Local id within the owning tileset
    pub id: u32,
    properties: HashMap<String, String>,
    pub objects: Vec<TileObject>,
}

impl TilesetTile {
    pub fn new(id: u32) -> Self {
        TilesetTile {
            id,
            properties: HashMap::new(),
            objects: Vec::new(),
        }
    }

    pub fn with_object(mut self, object: TileObject) -> Self {
        self.objects.push(object);
        self
    }

    pub fn with_property(mut self, name: &str, value: &str) -> Self {
        self.properties.insert(name.to_string(), value.to_string());
        self
    }

    pub fn get_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(|s| s.as_str())
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }
}

#[derive(Debug)]
pub struct TileSet {
    pub name: String,
    pub image_path: Option<String>,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_count: u32,
    pub columns: u32,
    pub tiles: Vec<TilesetTile>,
}

impl TileSet {
    pub fn new(name: &str, tile_width: u32, tile_height: u32, tile_count: u32) -> Self {
        TileSet {
            name: name.to_string(),
            image_path: None,
            tile_width,
            tile_height,
            tile_count,
            columns: 0,
            tiles: Vec::new(),
        }
    }

    pub fn with_tile(mut self, tile: TilesetTile) -> Self {
        self.tiles.push(tile);
        self
    }

    /// Looks up the tile record for a local id. Tiles without properties or collision
    /// objects usually have no record.
    pub fn tile(&self, local_id: u32) -> Option<&TilesetTile> {
        self.tiles.iter().find(|t| t.id == local_id)
    }

    /// Loads an external tileset file.
    pub fn new_tsx(spritesheet: &Path) -> Result<Self> {
        let file = File::open(spritesheet)
            .with_context(|| format!("Unable to open {}", spritesheet.display()))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("Unable to parse tileset {}", spritesheet.display()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut events = EventReader::new(reader).into_iter();
        while let Some(e) = events.next() {
            match e.context("Malformed tsx xml")? {
                XmlEvent::StartElement {
                    name, attributes, ..
                } if name.local_name == "tileset" => {
                    return Self::parse_element(&attributes, &mut events);
                }
                _ => {}
            }
        }
        anyhow::bail!("Expected a <tileset> element in tsx document")
    }

    /// Parses the body of a <tileset> element whose start tag has just been consumed,
    /// stopping after its end tag. Used for both tsx files and tilesets embedded in a tmx.
    pub(crate) fn parse_element<R: Read>(
        attributes: &[OwnedAttribute],
        events: &mut Events<R>,
    ) -> Result<Self> {
        let mut tileset = TileSet::new("", 0, 0, 0);
        for attr in attributes {
            match attr.name.local_name.as_str() {
                "name" => tileset.name = attr.value.clone(),
                "tilewidth" => tileset.tile_width = parse_attr(attr, "tileset")?,
                "tileheight" => tileset.tile_height = parse_attr(attr, "tileset")?,
                "tilecount" => tileset.tile_count = parse_attr(attr, "tileset")?,
                "columns" => tileset.columns = parse_attr(attr, "tileset")?,
                _ => {}
            }
        }
        if tileset.tile_width == 0 || tileset.tile_height == 0 {
            anyhow::bail!("<tileset> element missing 'tilewidth' or 'tileheight' attribute.");
        }

        let mut current_tile: Option<TilesetTile> = None;
        // collision object being read, and the name of its shape element if it isn't a plain rect
        let mut current_object: Option<(TileObject, Option<String>)> = None;

        for e in events {
            match e.context("Malformed tileset xml")? {
                XmlEvent::StartElement {
                    name, attributes, ..
                } => match name.local_name.as_str() {
                    "image" => {
                        for attr in attributes {
                            if attr.name.local_name == "source" {
                                tileset.image_path = Some(attr.value);
                                break;
                            }
                        }
                    }
                    "tile" => {
                        let mut id: Option<u32> = None;
                        for attr in &attributes {
                            if attr.name.local_name == "id" {
                                id = Some(parse_attr(attr, "tile")?);
                            }
                        }
                        current_tile = Some(TilesetTile::new(
                            id.context("Expect <tile> to have 'id' attr.")?,
                        ));
                    }
                    "property" => {
                        let mut attr_name: Option<String> = None;
                        let mut attr_value: Option<String> = None;
                        for attr in attributes {
                            match attr.name.local_name.as_str() {
                                "name" => attr_name = Some(attr.value),
                                "value" => attr_value = Some(attr.value),
                                _ => {}
                            }
                        }
                        let attr_name =
                            attr_name.context("Expected <property> to have a 'name' attribute")?;
                        let attr_value = attr_value
                            .context("Expected <property> to have a 'value' attribute")?;
                        // tileset-level properties aren't used
                        if let Some(tile) = current_tile.as_mut() {
                            tile.properties.insert(attr_name, attr_value);
                        }
                    }
                    "object" => {
                        if current_tile.is_none() {
                            anyhow::bail!("Encountered <object> outside of a <tile> in <tileset>");
                        }
                        let mut object = TileObject::new(0, point2(0.0, 0.0), vec2(0.0, 0.0));
                        for attr in &attributes {
                            match attr.name.local_name.as_str() {
                                "id" => object.id = parse_attr(attr, "object")?,
                                "x" => object.origin.x = parse_attr(attr, "object")?,
                                "y" => object.origin.y = parse_attr(attr, "object")?,
                                "width" => object.extent.x = parse_attr(attr, "object")?,
                                "height" => object.extent.y = parse_attr(attr, "object")?,
                                _ => {}
                            }
                        }
                        current_object = Some((object, None));
                    }
                    "ellipse" | "polygon" | "polyline" | "point" => {
                        if let Some((_, shape)) = current_object.as_mut() {
                            *shape = Some(name.local_name.clone());
                        }
                    }
                    _ => {}
                },
                XmlEvent::EndElement { name } => match name.local_name.as_str() {
                    "object" => {
                        let (object, shape) = current_object
                            .take()
                            .context("Expected to have a valid object when reaching </object>")?;
                        let tile = current_tile
                            .as_mut()
                            .context("Encountered </object> outside of a <tile> in <tileset>")?;
                        let shape = shape.as_deref().unwrap_or("rect");
                        if object.extent.x <= 0.0 || object.extent.y <= 0.0 {
                            log::debug!(
                                "Ignoring zero-area {} collision object {} on tile {} of tileset \"{}\"",
                                shape,
                                object.id,
                                tile.id,
                                tileset.name
                            );
                        } else {
                            if shape != "rect" {
                                log::debug!(
                                    "Approximating {} collision object {} on tile {} of tileset \"{}\" by its bounding rect",
                                    shape,
                                    object.id,
                                    tile.id,
                                    tileset.name
                                );
                            }
                            tile.objects.push(object);
                        }
                    }
                    "tile" => {
                        let tile = current_tile
                            .take()
                            .context("Expected to have a valid Tile when reaching </tile>")?;
                        tileset.tiles.push(tile);
                    }
                    "tileset" => return Ok(tileset),
                    _ => {}
                },
                _ => {}
            }
        }

        anyhow::bail!("Reached end of document before </tileset>")
    }
}

#[cfg(test)]
mod tileset_tests {
    use super::*;

    const TSX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.5" tiledversion="1.7.0" name="walls" tilewidth="32" tileheight="32" tilecount="4" columns="2">
 <image source="walls.png" width="64" height="64"/>
 <tile id="0">
  <properties>
   <property name="kind" value="solid"/>
  </properties>
  <objectgroup draworder="index" id="2">
   <object id="1" x="0" y="0" width="32" height="32"/>
  </objectgroup>
 </tile>
 <tile id="3">
  <objectgroup draworder="index" id="2">
   <object id="1" x="0" y="16" width="8" height="16"/>
   <object id="2" x="24" y="16" width="8" height="16"/>
   <object id="3" x="4" y="4"><point/></object>
  </objectgroup>
 </tile>
</tileset>
"#;

    #[test]
    fn from_reader_loads_tiles_and_objects() {
        let tileset = TileSet::from_reader(TSX.as_bytes()).unwrap();
        assert_eq!(tileset.name, "walls");
        assert_eq!(tileset.image_path.as_deref(), Some("walls.png"));
        assert_eq!(tileset.tile_width, 32);
        assert_eq!(tileset.tile_height, 32);
        assert_eq!(tileset.tile_count, 4);
        assert_eq!(tileset.columns, 2);
        assert_eq!(tileset.tiles.len(), 2);

        let solid = tileset.tile(0).unwrap();
        assert_eq!(solid.get_property("kind"), Some("solid"));
        assert_eq!(solid.objects.len(), 1);
        assert_eq!(solid.objects[0].rect(), Rect::from_xywh(0.0, 0.0, 32.0, 32.0));

        let posts = tileset.tile(3).unwrap();
        assert!(!posts.has_property("kind"));
        assert_eq!(posts.objects.len(), 2);
        assert_eq!(posts.objects[1].rect(), Rect::from_xywh(24.0, 16.0, 8.0, 16.0));
    }

    #[test]
    fn shaped_objects_use_their_bounding_rect() {
        let tsx = r#"<tileset name="round" tilewidth="32" tileheight="32" tilecount="1" columns="1">
 <tile id="0">
  <objectgroup draworder="index" id="2">
   <object id="1" x="4" y="6" width="20" height="10"><ellipse/></object>
   <object id="2" x="0" y="0"><polygon points="0,0 8,0 8,8"/></object>
  </objectgroup>
 </tile>
</tileset>"#;
        let tileset = TileSet::from_reader(tsx.as_bytes()).unwrap();
        let tile = tileset.tile(0).unwrap();
        // the polygon has no width or height, so only the ellipse survives
        assert_eq!(tile.objects.len(), 1);
        assert_eq!(tile.objects[0].id, 1);
        assert_eq!(tile.objects[0].rect(), Rect::from_xywh(4.0, 6.0, 20.0, 10.0));
    }

    #[test]
    fn tiles_without_records_are_none() {
        let tileset = TileSet::from_reader(TSX.as_bytes()).unwrap();
        assert!(tileset.tile(1).is_none());
        assert!(tileset.tile(2).is_none());
        assert!(tileset.tile(99).is_none());
    }

    #[test]
    fn missing_tile_size_is_an_error() {
        let tsx = r#"<tileset name="broken" tilecount="1"></tileset>"#;
        assert!(TileSet::from_reader(tsx.as_bytes()).is_err());
    }

    #[test]
    fn bad_attribute_is_an_error() {
        let tsx = r#"<tileset name="x" tilewidth="32" tileheight="32">
 <tile id="zero"></tile>
</tileset>"#;
        assert!(TileSet::from_reader(tsx.as_bytes()).is_err());
    }
}
