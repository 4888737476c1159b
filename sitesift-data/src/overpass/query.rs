//! Overpass QL program construction.
//!
//! One program per tile: a union over the dataset's tag filters, each
//! applied to nodes, ways and relations inside the tile's bounding box.
//! `out geom` inlines way vertex chains and relation member geometry so the
//! extractor can compute centroids without follow-up lookups.

use std::fmt::Write as _;

use sitesift_core::{TagFilter, Tile};

/// Element families queried for every filter.
const ELEMENT_KINDS: [&str; 3] = ["node", "way", "relation"];

pub(super) fn build_query(tile: &Tile, filters: &[TagFilter], timeout_secs: u32) -> String {
    let (south, west, north, east) = tile.bbox();
    let bbox = format!("({south},{west},{north},{east})");

    let mut program = format!("[out:json][timeout:{timeout_secs}];\n(\n");
    for filter in filters {
        let selector = selector(filter);
        for kind in ELEMENT_KINDS {
            let _ = writeln!(program, "  {kind}{selector}{bbox};");
        }
    }
    program.push_str(");\nout geom;\n");
    program
}

fn selector(filter: &TagFilter) -> String {
    match filter {
        TagFilter::Equals { key, value } => format!("[\"{key}\"=\"{value}\"]"),
        TagFilter::OneOf { key, values } => {
            format!("[\"{key}\"~\"^({})$\"]", values.join("|"))
        }
        TagFilter::Present { key } => format!("[\"{key}\"]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, Rect};

    fn tile() -> Tile {
        Tile {
            index: 0,
            bounds: Rect::new(Coord { x: 5.7, y: 49.4 }, Coord { x: 6.5, y: 50.2 }),
        }
    }

    #[test]
    fn program_scopes_every_selection_to_the_bbox() {
        let filters = vec![TagFilter::Equals {
            key: "amenity",
            value: "place_of_worship",
        }];
        let program = build_query(&tile(), &filters, 90);

        assert!(program.starts_with("[out:json][timeout:90];"));
        assert!(program.contains(
            "node[\"amenity\"=\"place_of_worship\"](49.4,5.7,50.2,6.5);"
        ));
        assert!(program.contains(
            "way[\"amenity\"=\"place_of_worship\"](49.4,5.7,50.2,6.5);"
        ));
        assert!(program.contains(
            "relation[\"amenity\"=\"place_of_worship\"](49.4,5.7,50.2,6.5);"
        ));
        assert!(program.trim_end().ends_with("out geom;"));
    }

    #[test]
    fn one_of_filters_render_as_anchored_alternation() {
        let filters = vec![TagFilter::OneOf {
            key: "historic",
            values: vec!["fort", "castle"],
        }];
        let program = build_query(&tile(), &filters, 25);
        assert!(program.contains("[\"historic\"~\"^(fort|castle)$\"]"));
    }

    #[test]
    fn presence_filters_render_bare() {
        let filters = vec![TagFilter::Present { key: "military" }];
        let program = build_query(&tile(), &filters, 25);
        assert!(program.contains("node[\"military\"](49.4,5.7,50.2,6.5);"));
    }
}
