// SPDX-License-Identifier: GPL-3.0-only

//! File system attributes, storage pools and filesets

use std::collections::BTreeMap;

use gpfs_types::{Filesystem, Fileset, FilesetKind, StoragePool};
use tracing::debug;

use crate::error::{Result, SysError};
use crate::escape::strip_noise;
use crate::parse::header::{Column, Columns};
use crate::parse::legacy::{LineRule, Matcher, Tokens, first_match};
use crate::parse::{FILESET_LISTING, FILESYSTEM_LISTING, parse_records};

pub const MMLSFS: &str = "mmlsfs";
pub const MMLSPOOL: &str = "mmlspool";
pub const MMLSFILESET: &str = "mmlsfileset";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum AttributeField {
    Name,
    Value,
}

const ATTRIBUTE_COLUMNS: Columns<AttributeField> = Columns {
    command: MMLSFS,
    known: &[
        ("fieldName", Column::Typed(AttributeField::Name)),
        ("data", Column::Typed(AttributeField::Value)),
        ("remarks", Column::Attribute),
    ],
    known_prefixes: &[],
};

/// Parse `mmlsfs <device> -Y` into attribute name → value.
pub fn parse_attributes(output: &str) -> Result<BTreeMap<String, String>> {
    let records = parse_records(&FILESYSTEM_LISTING, output)?;
    ATTRIBUTE_COLUMNS.warn_unrecognized(&records);

    let mut attributes = BTreeMap::new();
    for record in records {
        let mut bound = ATTRIBUTE_COLUMNS.bind(record);
        let Some(name) = bound.take_non_empty(AttributeField::Name) else {
            return Err(SysError::malformed(MMLSFS, "", "record without fieldName"));
        };
        attributes.insert(name, bound.take(AttributeField::Value).unwrap_or_default());
    }

    Ok(attributes)
}

#[derive(Debug, Clone, Copy)]
enum PoolLine {
    Banner,
    Row,
}

const POOL_RULES: &[LineRule<PoolLine>] = &[
    LineRule {
        matcher: Matcher::Contains("Storage pools in file system"),
        action: PoolLine::Banner,
    },
    LineRule {
        matcher: Matcher::ContainsAll(&["Name", "Id", "BlkSize", "Total Data"]),
        action: PoolLine::Banner,
    },
    LineRule {
        matcher: Matcher::Any,
        action: PoolLine::Row,
    },
];

const POOL_COLUMNS: usize = 12;

/// Parse `mmlspool <device>`.
///
/// Free-space percentages are printed as `( 97%)`; the decoration is
/// stripped before the line is split.
pub fn parse_pools(output: &str) -> Result<Vec<StoragePool>> {
    let mut pools = Vec::new();

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some(PoolLine::Row) = first_match(POOL_RULES, line) else {
            continue;
        };

        let stripped = strip_noise(line);
        let tokens = Tokens::new(MMLSPOOL, &stripped);
        tokens.require(POOL_COLUMNS)?;

        pools.push(StoragePool {
            name: tokens.get(0)?.to_string(),
            id: tokens.parse(1, "pool id")?,
            block_size: tokens.parse(2, "block size")?,
            block_size_unit: tokens.get(3)?.to_string(),
            holds_data: parse_flag(&tokens, 4)?,
            holds_metadata: parse_flag(&tokens, 5)?,
            data_total_kb: tokens.parse(6, "total data")?,
            data_free_kb: tokens.parse(7, "free data")?,
            data_free_percent: tokens.parse(8, "free data percent")?,
            meta_total_kb: tokens.parse(9, "total metadata")?,
            meta_free_kb: tokens.parse(10, "free metadata")?,
            meta_free_percent: tokens.parse(11, "free metadata percent")?,
        });
    }

    Ok(pools)
}

fn parse_flag(tokens: &Tokens<'_>, position: usize) -> Result<bool> {
    match tokens.get(position)? {
        "yes" => Ok(true),
        "no" => Ok(false),
        other => Err(tokens.malformed(format!("expected yes/no, found {other:?}"))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum FilesetField {
    Name,
    Id,
    Status,
    Path,
    InodeSpace,
    Comment,
}

const FILESET_COLUMNS: Columns<FilesetField> = Columns {
    command: MMLSFILESET,
    known: &[
        ("filesetName", Column::Typed(FilesetField::Name)),
        ("id", Column::Typed(FilesetField::Id)),
        ("status", Column::Typed(FilesetField::Status)),
        ("path", Column::Typed(FilesetField::Path)),
        ("inodeSpace", Column::Typed(FilesetField::InodeSpace)),
        ("comment", Column::Typed(FilesetField::Comment)),
        ("rootInode", Column::Attribute),
        ("parentId", Column::Attribute),
        ("created", Column::Attribute),
        ("inodes", Column::Attribute),
        ("dataInKB", Column::Attribute),
        ("filesetMode", Column::Attribute),
        ("isInodeSpaceOwner", Column::Attribute),
        ("maxInodes", Column::Attribute),
        ("allocInodes", Column::Attribute),
        ("inodeSpaceMask", Column::Attribute),
        ("freeInodes", Column::Attribute),
        ("snapId", Column::Attribute),
        ("permChangeFlag", Column::Attribute),
        ("permInheritFlag", Column::Attribute),
        ("isAFM", Column::Attribute),
        ("reserved", Column::Attribute),
    ],
    known_prefixes: &["afm"],
};

/// Parse `mmlsfileset <device> -Y`.
pub fn parse_filesets(device: &str, output: &str) -> Result<Vec<Fileset>> {
    let records = parse_records(&FILESET_LISTING, output)?;
    FILESET_COLUMNS.warn_unrecognized(&records);

    records
        .into_iter()
        .map(|record| {
            let mut bound = FILESET_COLUMNS.bind(record);
            let Some(name) = bound.take_non_empty(FilesetField::Name) else {
                return Err(SysError::malformed(MMLSFILESET, "", "record without filesetName"));
            };
            let inode_space = bound.take(FilesetField::InodeSpace);
            let kind = FilesetKind::classify(&name, inode_space.as_deref());

            Ok(Fileset {
                device: device.to_string(),
                id: bound
                    .take(FilesetField::Id)
                    .and_then(|raw| raw.trim().parse().ok()),
                status: bound.take_non_empty(FilesetField::Status),
                path: bound.take_non_empty(FilesetField::Path),
                inode_space: inode_space.and_then(|raw| raw.trim().parse().ok()),
                comment: bound.take_non_empty(FilesetField::Comment),
                kind,
                attributes: bound.attributes,
                name,
            })
        })
        .collect()
}

/// Assemble a file system model from its three listings.
pub fn build_filesystem(
    device: &str,
    attributes_output: &str,
    pools_output: &str,
    filesets_output: &str,
) -> Result<Filesystem> {
    let filesystem = Filesystem {
        device: device.to_string(),
        attributes: parse_attributes(attributes_output)?,
        pools: parse_pools(pools_output)?,
        filesets: parse_filesets(device, filesets_output)?,
    };

    debug!(
        "Built file system {} with {} attributes, {} pools, {} filesets",
        device,
        filesystem.attributes.len(),
        filesystem.pools.len(),
        filesystem.filesets.len()
    );
    Ok(filesystem)
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const MMLSFS_OUTPUT: &str = "\
mmlsfs::HEADER:version:reserved:reserved:deviceName:fieldName:data:remarks:
mmlsfs::0:1:::gpfs0:minFragmentSize:8192::
mmlsfs::0:1:::gpfs0:defaultMetadataReplicas:2::
mmlsfs::0:1:::gpfs0:maxMetadataReplicas:3::
mmlsfs::0:1:::gpfs0:defaultDataReplicas:1::
mmlsfs::0:1:::gpfs0:maxDataReplicas:3::
mmlsfs::0:1:::gpfs0:blockAllocationType:cluster::
mmlsfs::0:1:::gpfs0:blockSize:262144::
mmlsfs::0:1:::gpfs0:defaultMountPoint:%2Fgpfs%2Fgpfs0::
mmlsfs::0:1:::gpfs0:mountOptions:rw%3Aatime::
";

    pub const MMLSPOOL_OUTPUT: &str = "\
Storage pools in file system at '/gpfs/gpfs0':
Name                    Id   BlkSize Data Meta Total Data in (KB)   Free Data in (KB)   Total Meta in (KB)    Free Meta in (KB)
system                   0    256 KB  yes  yes      20971520      20405248 ( 97%)       20971520      20406016 ( 97%)
data                 65537      4 MB  yes   no    1048576000     524288000 ( 50%)              0             0 (  0%)
";

    pub const MMLSFILESET_OUTPUT: &str = "\
mmlsfileset::HEADER:version:reserved:reserved:filesystemName:filesetName:id:rootInode:status:path:parentId:created:inodes:dataInKB:comment:filesetMode:inodeSpace:isInodeSpaceOwner:maxInodes:allocInodes:
mmlsfileset::0:1:::gpfs0:root:0:3:Linked:%2Fgpfs%2Fgpfs0:--:Mon Jan  1 00%3A00%3A00 2024:0:0:root fileset:off:0:1:100000:65792:
mmlsfileset::0:1:::gpfs0:home:1:131075:Linked:%2Fgpfs%2Fgpfs0%2Fhome:0:Mon Jan  1 00%3A00%3A00 2024:0:0::off:1:1:200000:100032:
mmlsfileset::0:1:::gpfs0:projects:2:24576:Linked:%2Fgpfs%2Fgpfs0%2Fprojects:0:Mon Jan  1 00%3A00%3A00 2024:0:0::off:0:0:0:0:
";
}
