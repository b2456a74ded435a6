//! Structure-template packing.
//!
//! A structure compound carries a `palette` list of block-state compounds
//! (`Name` string plus optional `Properties` string map) and a `blocks` list
//! whose entries reference the palette by integer `state` index. Packing
//! flattens each palette entry to the canonical string
//! `name{key1:val1,key2:val2}` (properties sorted by key), rewrites block
//! state references to those strings, and renames `blocks` to `data`.
//! Unpacking is the exact inverse.

use crate::error::{NbtError, Result};
use crate::snbt;
use crate::tag::{CompoundTag, ListTag, Tag, TagId};

/// Packs a structure compound into its palette-string form.
pub fn pack_structure_template(tag: &CompoundTag) -> Result<CompoundTag> {
    let mut out = tag.clone();

    // Multi-variant structures carry `palettes`, a list of palette lists;
    // packing collapses to the first variant.
    let palette = match out.get_list("palettes").and_then(|p| p.get(0)) {
        Some(Tag::List(first)) => first.clone(),
        _ => out.get_list("palette").cloned().unwrap_or_default(),
    };
    out.remove("palettes");

    let mut packed_palette = ListTag::with_element(TagId::String);
    let mut palette_strings = Vec::with_capacity(palette.len());
    for entry in &palette {
        if let Tag::Compound(state) = entry {
            let packed = pack_block_state(state);
            palette_strings.push(packed.clone());
            packed_palette.try_push(Tag::String(packed))?;
        }
    }
    out.put("palette", Tag::List(packed_palette));

    let Some(blocks) = out.get_list("blocks").cloned() else {
        return Ok(out); // nothing to pack
    };

    let mut data = ListTag::with_element(TagId::Compound);
    for block_tag in &blocks {
        let Tag::Compound(block) = block_tag else {
            continue;
        };
        let index = block.get_int("state").unwrap_or(0);
        let state = palette_strings.get(index as usize).ok_or(
            NbtError::StateIndexOutOfBounds {
                index,
                palette_len: palette_strings.len(),
            },
        )?;
        let mut packed_block = block.clone();
        packed_block.put("state", Tag::String(state.clone()));
        data.try_push(Tag::Compound(packed_block))?;
    }
    out.put("data", Tag::List(data));
    out.remove("blocks");

    Ok(out)
}

/// Unpacks a palette-string structure back into index form.
pub fn unpack_structure_template(tag: &CompoundTag) -> Result<CompoundTag> {
    let mut out = tag.clone();

    let palette = out
        .get_list("palette")
        .cloned()
        .ok_or(NbtError::MissingStructureKey("palette"))?;

    let mut unpacked_palette = ListTag::with_element(TagId::Compound);
    let mut state_indices: Vec<(String, i32)> = Vec::with_capacity(palette.len());
    for (i, entry) in palette.iter().enumerate() {
        let Tag::String(packed) = entry else {
            return Err(NbtError::corrupt("packed palette entry is not a string"));
        };
        unpacked_palette.try_push(Tag::Compound(unpack_block_state(packed)))?;
        state_indices.push((packed.clone(), i as i32));
    }
    out.put("palette", Tag::List(unpacked_palette));

    let Some(data) = out.get_list("data").cloned() else {
        return Ok(out); // nothing to unpack
    };

    let mut blocks = ListTag::with_element(TagId::Compound);
    for block_tag in &data {
        let Tag::Compound(block) = block_tag else {
            continue;
        };
        let state = block.get_string("state").unwrap_or_default();
        let index = state_indices
            .iter()
            .find(|(s, _)| s == state)
            .map(|(_, i)| *i)
            .ok_or_else(|| NbtError::UnknownPaletteEntry(state.to_string()))?;
        let mut unpacked_block = block.clone();
        unpacked_block.put("state", Tag::Int(index));
        blocks.try_push(Tag::Compound(unpacked_block))?;
    }
    out.put("blocks", Tag::List(blocks));
    out.remove("data");

    Ok(out)
}

/// Packs a structure compound and prints it as pretty SNBT.
pub fn structure_to_snbt(tag: &CompoundTag) -> Result<String> {
    let packed = pack_structure_template(tag)?;
    Ok(snbt::to_snbt_pretty(&Tag::Compound(packed)))
}

/// Parses SNBT text and unpacks it into a structure compound.
pub fn snbt_to_structure(text: &str) -> Result<CompoundTag> {
    let parsed =
        snbt::from_snbt(text).map_err(|e| NbtError::corrupt(e.to_string()))?;
    unpack_structure_template(&parsed)
}

fn pack_block_state(state: &CompoundTag) -> String {
    let mut out = state.get_string("Name").unwrap_or_default().to_string();
    let Some(props) = state.get_compound("Properties") else {
        return out;
    };
    if props.is_empty() {
        return out;
    }

    out.push('{');
    // CompoundTag iteration is already sorted by key.
    for (i, (key, value)) in props.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(key);
        out.push(':');
        out.push_str(value.as_string().unwrap_or_default());
    }
    out.push('}');
    out
}

fn unpack_block_state(packed: &str) -> CompoundTag {
    let mut state = CompoundTag::new();
    let Some(open) = packed.find('{') else {
        state.put("Name", Tag::String(packed.to_string()));
        return state;
    };

    state.put("Name", Tag::String(packed[..open].to_string()));

    let close = packed.rfind('}').unwrap_or(packed.len());
    let mut props = CompoundTag::new();
    for pair in packed[open + 1..close].split(',') {
        if let Some((key, value)) = pair.split_once(':') {
            props.put(key, Tag::String(value.to_string()));
        }
    }
    state.put("Properties", Tag::Compound(props));
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_state(name: &str, props: &[(&str, &str)]) -> Tag {
        let mut state = CompoundTag::new();
        state.put("Name", Tag::String(name.to_string()));
        if !props.is_empty() {
            let mut properties = CompoundTag::new();
            for (k, v) in props {
                properties.put(*k, Tag::String(v.to_string()));
            }
            state.put("Properties", Tag::Compound(properties));
        }
        Tag::Compound(state)
    }

    fn block(x: i32, state: i32) -> Tag {
        let mut b = CompoundTag::new();
        let mut pos = ListTag::with_element(TagId::Int);
        for v in [x, 0, 0] {
            pos.try_push(Tag::Int(v)).unwrap();
        }
        b.put("pos", Tag::List(pos));
        b.put("state", Tag::Int(state));
        Tag::Compound(b)
    }

    fn sample_structure() -> CompoundTag {
        let mut palette = ListTag::with_element(TagId::Compound);
        palette.try_push(block_state("minecraft:stone", &[])).unwrap();
        palette
            .try_push(block_state(
                "minecraft:oak_stairs",
                &[("facing", "east"), ("half", "bottom")],
            ))
            .unwrap();

        let mut blocks = ListTag::with_element(TagId::Compound);
        blocks.try_push(block(0, 0)).unwrap();
        blocks.try_push(block(1, 1)).unwrap();
        blocks.try_push(block(2, 0)).unwrap();

        let mut structure = CompoundTag::new();
        structure.put("palette", Tag::List(palette));
        structure.put("blocks", Tag::List(blocks));
        structure
    }

    #[test]
    fn pack_rewrites_states_to_palette_strings() {
        let packed = pack_structure_template(&sample_structure()).unwrap();

        assert!(!packed.contains("blocks"));
        let palette = packed.get_list("palette").unwrap();
        assert_eq!(palette.element(), TagId::String);
        assert_eq!(
            palette.get(1).unwrap().as_string(),
            Some("minecraft:oak_stairs{facing:east,half:bottom}")
        );

        let data = packed.get_list("data").unwrap();
        let first = data.get(0).unwrap().as_compound().unwrap();
        assert_eq!(first.get_string("state"), Some("minecraft:stone"));
    }

    #[test]
    fn unpack_inverts_pack() {
        let original = sample_structure();
        let packed = pack_structure_template(&original).unwrap();
        let unpacked = unpack_structure_template(&packed).unwrap();
        assert_eq!(unpacked, original);
    }

    #[test]
    fn palettes_list_collapses_to_first_variant() {
        let mut variant = ListTag::with_element(TagId::Compound);
        variant.try_push(block_state("minecraft:dirt", &[])).unwrap();
        let mut palettes = ListTag::with_element(TagId::List);
        palettes.try_push(Tag::List(variant)).unwrap();

        let mut blocks = ListTag::with_element(TagId::Compound);
        blocks.try_push(block(0, 0)).unwrap();

        let mut structure = CompoundTag::new();
        structure.put("palettes", Tag::List(palettes));
        structure.put("blocks", Tag::List(blocks));

        let packed = pack_structure_template(&structure).unwrap();
        assert!(!packed.contains("palettes"));
        assert_eq!(
            packed.get_list("palette").unwrap().get(0).unwrap().as_string(),
            Some("minecraft:dirt")
        );
    }

    #[test]
    fn out_of_bounds_state_index_fails_pack() {
        let mut structure = sample_structure();
        let mut blocks = ListTag::with_element(TagId::Compound);
        blocks.try_push(block(0, 9)).unwrap();
        structure.put("blocks", Tag::List(blocks));

        let err = pack_structure_template(&structure).unwrap_err();
        assert!(matches!(err, NbtError::StateIndexOutOfBounds { index: 9, .. }));
    }

    #[test]
    fn unknown_palette_entry_fails_unpack() {
        let mut packed = pack_structure_template(&sample_structure()).unwrap();

        // Corrupt one block's state reference.
        let data = packed.get_list("data").unwrap().clone();
        let mut bad = ListTag::with_element(TagId::Compound);
        for (i, entry) in data.iter().enumerate() {
            let mut block = entry.as_compound().unwrap().clone();
            if i == 0 {
                block.put("state", Tag::String("minecraft:missing".into()));
            }
            bad.try_push(Tag::Compound(block)).unwrap();
        }
        packed.put("data", Tag::List(bad));

        let err = unpack_structure_template(&packed).unwrap_err();
        assert!(matches!(err, NbtError::UnknownPaletteEntry(s) if s == "minecraft:missing"));
    }

    #[test]
    fn snbt_round_trip() {
        let original = sample_structure();
        let text = structure_to_snbt(&original).unwrap();
        let back = snbt_to_structure(&text).unwrap();
        assert_eq!(back, original);
    }
}
