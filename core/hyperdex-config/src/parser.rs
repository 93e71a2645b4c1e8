//! The coordinator's line-based configuration format (spec §6). Parsing is
//! strict: the very first malformed or unknown line rejects the whole
//! configuration (the node replies `BAD\n`); only a complete, internally
//! consistent configuration followed by the `end\tof\tline` trailer is
//! accepted (`ACK\n`).

use crate::host::Host;
use crate::region::Region;
use crate::schema::{Attribute, Space, Subspace};
use crate::transfer::Transfer;
use hyperdex_datatype::DataType;
use hyperdex_error::ConfigError;
use hyperdex_ids::{RegionId, SpaceId, SubspaceId};
use std::collections::HashMap;
use std::net::IpAddr;

const TRAILER: &str = "end\tof\tline";

#[derive(Default)]
pub(crate) struct Builder {
    pub(crate) hosts: HashMap<u32, Host>,
    pub(crate) spaces_by_name: HashMap<String, SpaceId>,
    pub(crate) spaces: HashMap<SpaceId, Space>,
    pub(crate) subspaces: HashMap<SubspaceId, Subspace>,
    pub(crate) regions: HashMap<RegionId, Region>,
    pub(crate) transfers: HashMap<u16, Transfer>,
}

/// Parses `text` into a fully-populated [`Builder`]. Does not perform the
/// cross-line structural checks (region tiling, monotonic version) — those
/// need the rest of [`crate::Configuration::parse`]'s context and are
/// applied afterward.
pub(crate) fn parse_lines(text: &str) -> Result<Builder, ConfigError> {
    let mut builder = Builder::default();
    let mut saw_trailer = false;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        if line == TRAILER {
            saw_trailer = true;
            break;
        }

        let mut fields = line.split_whitespace();
        let command = fields.next().unwrap_or("");
        let rest: Vec<&str> = fields.collect();

        match command {
            "host" => parse_host(&mut builder, line_no, &rest)?,
            "space" => parse_space(&mut builder, line_no, &rest)?,
            "subspace" => parse_subspace(&mut builder, line_no, &rest)?,
            "region" => parse_region(&mut builder, line_no, &rest)?,
            "transfer" => parse_transfer(&mut builder, line_no, &rest)?,
            other => {
                return Err(ConfigError::UnknownLineKind { line_no, kind: other.to_string() })
            }
        }
    }

    if !saw_trailer {
        return Err(ConfigError::MissingTrailer);
    }

    Ok(builder)
}

fn malformed(line_no: usize, kind: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::MalformedLine { line_no, kind, reason: reason.into() }
}

fn parse_host(builder: &mut Builder, line_no: usize, rest: &[&str]) -> Result<(), ConfigError> {
    let [id_s, ip_s, iport_s, iver_s, oport_s, over_s] = rest else {
        return Err(malformed(line_no, "host", format!("expected 6 fields, got {}", rest.len())));
    };
    let id = u32::from_str_radix(id_s.trim_start_matches("0x"), 16)
        .map_err(|e| malformed(line_no, "host", format!("bad host id: {e}")))?;
    let ip: IpAddr = ip_s.parse().map_err(|e| malformed(line_no, "host", format!("bad ip: {e}")))?;
    let inbound_port: u16 = iport_s.parse().map_err(|e| malformed(line_no, "host", format!("bad inbound port: {e}")))?;
    let inbound_version: u16 = iver_s.parse().map_err(|e| malformed(line_no, "host", format!("bad inbound version: {e}")))?;
    let outbound_port: u16 = oport_s.parse().map_err(|e| malformed(line_no, "host", format!("bad outbound port: {e}")))?;
    let outbound_version: u16 = over_s.parse().map_err(|e| malformed(line_no, "host", format!("bad outbound version: {e}")))?;

    if builder.hosts.contains_key(&id) {
        return Err(malformed(line_no, "host", format!("duplicate host id {id:#x}")));
    }

    builder.hosts.insert(
        id,
        Host { id, ip, inbound_port, inbound_version, outbound_port, outbound_version },
    );
    Ok(())
}

fn parse_space(builder: &mut Builder, line_no: usize, rest: &[&str]) -> Result<(), ConfigError> {
    if rest.len() < 3 {
        return Err(malformed(line_no, "space", "expected id, name, and at least one attribute"));
    }
    let id_s = rest[0];
    let name = rest[1];
    let id = u32::from_str_radix(id_s.trim_start_matches("0x"), 16)
        .map_err(|e| malformed(line_no, "space", format!("bad space id: {e}")))?;
    let space_id = SpaceId::new(id);

    if builder.spaces.contains_key(&space_id) || builder.spaces_by_name.contains_key(name) {
        return Err(malformed(line_no, "space", format!("duplicate space {name:?}")));
    }

    let mut attrs = Vec::with_capacity(rest.len() - 2);
    let mut seen = std::collections::HashSet::new();
    for token in &rest[2..] {
        let (attr_name, type_token) = token
            .split_once(':')
            .ok_or_else(|| malformed(line_no, "space", format!("attribute {token:?} missing :type")))?;
        let kind = DataType::from_token(type_token)
            .ok_or_else(|| malformed(line_no, "space", format!("unknown type {type_token:?}")))?;
        if !seen.insert(attr_name.to_string()) {
            return Err(malformed(line_no, "space", format!("duplicate attribute {attr_name:?}")));
        }
        attrs.push(Attribute { name: attr_name.to_string(), kind });
    }

    builder.spaces_by_name.insert(name.to_string(), space_id);
    builder.spaces.insert(space_id, Space { id: space_id, name: name.to_string(), attrs });
    Ok(())
}

fn parse_subspace(builder: &mut Builder, line_no: usize, rest: &[&str]) -> Result<(), ConfigError> {
    if rest.len() < 3 {
        return Err(malformed(line_no, "subspace", "expected space name, number, and at least one attribute"));
    }
    let space_name = rest[0];
    let number: u16 = rest[1]
        .parse()
        .map_err(|e| malformed(line_no, "subspace", format!("bad subspace number: {e}")))?;

    let space_id = *builder
        .spaces_by_name
        .get(space_name)
        .ok_or_else(|| ConfigError::UnknownSpace { space_name: space_name.to_string() })?;
    let space = builder.spaces.get(&space_id).expect("space_id came from spaces_by_name");

    let attr_names = &rest[2..];
    if number == 0 && attr_names.len() != 1 {
        return Err(malformed(line_no, "subspace", "subspace 0 must select exactly the key attribute"));
    }
    if number == 0 && attr_names[0] != space.key_attr().name {
        return Err(malformed(
            line_no,
            "subspace",
            format!("subspace 0 must select the key attribute {:?}", space.key_attr().name),
        ));
    }

    let mut mask = vec![false; space.attrs.len()];
    for attr_name in attr_names {
        let idx = space.attr_index(attr_name).ok_or_else(|| {
            malformed(line_no, "subspace", format!("space {space_name:?} has no attribute {attr_name:?}"))
        })?;
        if mask[idx] {
            return Err(malformed(line_no, "subspace", format!("attribute {attr_name:?} repeated")));
        }
        mask[idx] = true;
        if space.attrs[idx].kind.is_aggregate() {
            return Err(ConfigError::AggregateAttributeInSubspace {
                space_name: space_name.to_string(),
                subspace_num: number,
                attr: attr_name.to_string(),
            });
        }
    }

    let subspace_id = SubspaceId::new(space_id, number);
    if builder.subspaces.contains_key(&subspace_id) {
        return Err(malformed(line_no, "subspace", format!("duplicate subspace {number} of {space_name:?}")));
    }
    builder.subspaces.insert(subspace_id, Subspace { space: space_id, number, mask });
    Ok(())
}

fn parse_region(builder: &mut Builder, line_no: usize, rest: &[&str]) -> Result<(), ConfigError> {
    if rest.len() < 5 {
        return Err(malformed(line_no, "region", "expected space, subspace, prefix bits, prefix hex, and at least one host"));
    }
    let space_name = rest[0];
    let subspace_num: u16 = rest[1]
        .parse()
        .map_err(|e| malformed(line_no, "region", format!("bad subspace number: {e}")))?;
    let prefix_len: u8 = rest[2]
        .parse()
        .map_err(|e| malformed(line_no, "region", format!("bad prefix length: {e}")))?;
    let prefix = u64::from_str_radix(rest[3].trim_start_matches("0x"), 16)
        .map_err(|e| malformed(line_no, "region", format!("bad prefix: {e}")))?;

    let space_id = *builder
        .spaces_by_name
        .get(space_name)
        .ok_or_else(|| ConfigError::UnknownSpace { space_name: space_name.to_string() })?;
    let subspace_id = SubspaceId::new(space_id, subspace_num);
    if !builder.subspaces.contains_key(&subspace_id) {
        return Err(ConfigError::UnknownSubspace { space_name: space_name.to_string(), subspace_num });
    }

    let mut chain = Vec::with_capacity(rest.len() - 4);
    for host_s in &rest[4..] {
        let host_id = u32::from_str_radix(host_s.trim_start_matches("0x"), 16)
            .map_err(|e| malformed(line_no, "region", format!("bad host id: {e}")))?;
        if !builder.hosts.contains_key(&host_id) {
            return Err(ConfigError::UnknownHost { host_id: host_id as u64 });
        }
        if chain.contains(&host_id) {
            return Err(malformed(line_no, "region", format!("host {host_id:#x} appears twice in the chain")));
        }
        chain.push(host_id);
    }

    let region_id = RegionId::new(subspace_id, prefix_len, prefix);
    for existing in builder.regions.values() {
        if existing.id.subspace == subspace_id && regions_overlap(&existing.id, &region_id) {
            return Err(ConfigError::RegionsDoNotTile {
                subspace: subspace_id.to_string(),
                detail: format!("{} overlaps {}", existing.id, region_id),
            });
        }
    }

    builder.regions.insert(region_id, Region { id: region_id, chain });
    Ok(())
}

fn regions_overlap(a: &RegionId, b: &RegionId) -> bool {
    let shorter = a.prefix_len.min(b.prefix_len);
    let mask = RegionId::mask_for(shorter);
    a.prefix & mask == b.prefix & mask
}

fn parse_transfer(builder: &mut Builder, line_no: usize, rest: &[&str]) -> Result<(), ConfigError> {
    let [xfer_s, space_name, subspace_s, prefix_len_s, prefix_s, dest_s] = rest else {
        return Err(malformed(line_no, "transfer", format!("expected 6 fields, got {}", rest.len())));
    };
    let xfer_id: u16 = xfer_s.parse().map_err(|e| malformed(line_no, "transfer", format!("bad transfer id: {e}")))?;
    let subspace_num: u16 = subspace_s
        .parse()
        .map_err(|e| malformed(line_no, "transfer", format!("bad subspace number: {e}")))?;
    let prefix_len: u8 = prefix_len_s
        .parse()
        .map_err(|e| malformed(line_no, "transfer", format!("bad prefix length: {e}")))?;
    let prefix = u64::from_str_radix(prefix_s.trim_start_matches("0x"), 16)
        .map_err(|e| malformed(line_no, "transfer", format!("bad prefix: {e}")))?;
    let dest_host = u32::from_str_radix(dest_s.trim_start_matches("0x"), 16)
        .map_err(|e| malformed(line_no, "transfer", format!("bad dest host id: {e}")))?;

    let space_id = *builder
        .spaces_by_name
        .get(*space_name)
        .ok_or_else(|| ConfigError::UnknownSpace { space_name: space_name.to_string() })?;
    let subspace_id = SubspaceId::new(space_id, subspace_num);
    if !builder.subspaces.contains_key(&subspace_id) {
        return Err(ConfigError::UnknownSubspace { space_name: space_name.to_string(), subspace_num });
    }
    if !builder.hosts.contains_key(&dest_host) {
        return Err(ConfigError::UnknownHost { host_id: dest_host as u64 });
    }

    let region_id = RegionId::new(subspace_id, prefix_len, prefix);
    if !builder.regions.contains_key(&region_id) {
        return Err(malformed(line_no, "transfer", format!("transfer references undeclared region {region_id}")));
    }
    if builder.transfers.contains_key(&xfer_id) {
        return Err(malformed(line_no, "transfer", format!("duplicate transfer id {xfer_id}")));
    }

    builder.transfers.insert(xfer_id, Transfer { xfer_id, region: region_id, dest_host });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_command() {
        let err = parse_lines("bogus line\nend\tof\tline").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownLineKind { .. }));
    }

    #[test]
    fn rejects_missing_trailer() {
        let err = parse_lines("host 1 127.0.0.1 2000 1 2001 1").unwrap_err();
        assert_eq!(err, ConfigError::MissingTrailer);
    }

    #[test]
    fn parses_a_minimal_configuration() {
        let text = "host 1 127.0.0.1 2000 1 2001 1\n\
                    space 1 people key:string value:int64\n\
                    subspace people 0 key\n\
                    region people 0 0 0 1\n\
                    end\tof\tline";
        let builder = parse_lines(text).unwrap();
        assert_eq!(builder.hosts.len(), 1);
        assert_eq!(builder.spaces.len(), 1);
        assert_eq!(builder.regions.len(), 1);
    }

    #[test]
    fn rejects_overlapping_regions_in_the_same_subspace() {
        let text = "host 1 127.0.0.1 2000 1 2001 1\n\
                    space 1 people key:string\n\
                    subspace people 0 key\n\
                    region people 0 1 0000000000000000 1\n\
                    region people 0 0 0 1\n\
                    end\tof\tline";
        let err = parse_lines(text).unwrap_err();
        assert!(matches!(err, ConfigError::RegionsDoNotTile { .. }));
    }

    #[test]
    fn rejects_aggregate_attribute_in_subspace() {
        let text = "host 1 127.0.0.1 2000 1 2001 1\n\
                    space 1 people key:string tags:set_string\n\
                    subspace people 0 key\n\
                    subspace people 1 tags\n\
                    end\tof\tline";
        let err = parse_lines(text).unwrap_err();
        assert!(matches!(err, ConfigError::AggregateAttributeInSubspace { .. }));
    }
}
