//! Comma- or tab-separated tables
//!
//! Blank lines and lines starting with `#` are ignored. The delimiter is
//! taken from the header line: tab if it contains one, comma otherwise.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use geo_types::Geometry;
use ndarray::Array2;

use crate::community::CommunityMatrix;
use crate::error::{Error, Result};
use crate::matrix::DistanceMatrix;
use crate::vector::{grid_cell, site_point};

/// One parsed line with its 1-based line number.
struct Record {
    line: usize,
    fields: Vec<String>,
}

fn records<R: BufRead>(reader: R) -> Result<Vec<Record>> {
    let mut out = Vec::new();
    let mut delimiter = None;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim_end_matches('\r');
        if trimmed.trim().is_empty() || trimmed.trim_start().starts_with('#') {
            continue;
        }
        let delim = *delimiter.get_or_insert(if trimmed.contains('\t') { '\t' } else { ',' });
        out.push(Record {
            line: i + 1,
            fields: trimmed.split(delim).map(|f| f.trim().to_string()).collect(),
        });
    }

    Ok(out)
}

fn parse_f64(field: &str, line: usize) -> Result<f64> {
    field.parse::<f64>().map_err(|_| Error::Parse {
        line,
        reason: format!("expected a number, got '{field}'"),
    })
}

fn require_header(records: &[Record], what: &str) -> Result<()> {
    if records.is_empty() {
        return Err(Error::Parse {
            line: 0,
            reason: format!("empty {what} table"),
        });
    }
    Ok(())
}

/// Parse a square dissimilarity table.
///
/// Header: `,id1,id2,...`; then one row per unit: `id,v1,v2,...`.
/// Rows must appear in header order.
pub fn parse_distance_matrix<R: BufRead>(reader: R) -> Result<DistanceMatrix> {
    let recs = records(reader)?;
    require_header(&recs, "matrix")?;

    let units: Vec<String> = recs[0].fields.iter().skip(1).cloned().collect();
    let n = units.len();
    let body = &recs[1..];
    if body.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            rows: body.len(),
            cols: n,
        });
    }

    let mut values = Array2::<f64>::zeros((n, n));
    for (i, rec) in body.iter().enumerate() {
        if rec.fields.len() != n + 1 {
            return Err(Error::DimensionMismatch {
                expected: n,
                rows: body.len(),
                cols: rec.fields.len().saturating_sub(1),
            });
        }
        if rec.fields[0] != units[i] {
            return Err(Error::Parse {
                line: rec.line,
                reason: format!("row '{}' does not match column '{}'", rec.fields[0], units[i]),
            });
        }
        for (j, field) in rec.fields[1..].iter().enumerate() {
            values[[i, j]] = parse_f64(field, rec.line)?;
        }
    }

    DistanceMatrix::from_array(units, values)
}

pub fn read_distance_matrix<P: AsRef<Path>>(path: P) -> Result<DistanceMatrix> {
    parse_distance_matrix(BufReader::new(File::open(path)?))
}

/// Whether `id` survives a write/parse cycle as a table field.
fn is_plain_field(id: &str) -> bool {
    !id.is_empty()
        && id == id.trim()
        && !id.starts_with('#')
        && !id.contains(|c| matches!(c, ',' | '\t' | '\n' | '\r'))
}

/// Write a matrix in the format read by [`parse_distance_matrix`].
///
/// Fields are not quoted, so a unit id that contains a delimiter or a line
/// break, starts with `#` or carries surrounding whitespace is rejected
/// before the file is created.
pub fn write_distance_matrix<P: AsRef<Path>>(matrix: &DistanceMatrix, path: P) -> Result<()> {
    if let Some(bad) = matrix.units().iter().find(|u| !is_plain_field(u)) {
        return Err(Error::invalid("unit", format!("{bad:?}"), "cannot be written as a table field"));
    }
    let mut w = BufWriter::new(File::create(path)?);
    for u in matrix.units() {
        write!(w, ",{u}")?;
    }
    writeln!(w)?;
    for (i, u) in matrix.units().iter().enumerate() {
        write!(w, "{u}")?;
        for j in 0..matrix.size() {
            write!(w, ",{}", matrix.get(i, j))?;
        }
        writeln!(w)?;
    }
    w.flush()?;
    Ok(())
}

/// Parse unit geometries.
///
/// Header: `unit,x,y[,size]`. With a `size` column each unit becomes a
/// square grid cell of that edge centred on `(x, y)`; otherwise a point.
pub fn parse_geometries<R: BufRead>(reader: R) -> Result<HashMap<String, Geometry<f64>>> {
    let recs = records(reader)?;
    require_header(&recs, "geometry")?;

    let has_size = recs[0].fields.len() >= 4;
    let expected = if has_size { 4 } else { 3 };
    let mut out = HashMap::with_capacity(recs.len() - 1);

    for rec in &recs[1..] {
        if rec.fields.len() != expected {
            return Err(Error::Parse {
                line: rec.line,
                reason: format!("expected {expected} fields, got {}", rec.fields.len()),
            });
        }
        let x = parse_f64(&rec.fields[1], rec.line)?;
        let y = parse_f64(&rec.fields[2], rec.line)?;
        let geom = if has_size {
            let size = parse_f64(&rec.fields[3], rec.line)?;
            if !(size > 0.0) {
                return Err(Error::Parse {
                    line: rec.line,
                    reason: format!("cell size must be positive, got {size}"),
                });
            }
            Geometry::Polygon(grid_cell(x, y, size))
        } else {
            site_point(x, y)
        };
        if out.insert(rec.fields[0].clone(), geom).is_some() {
            return Err(Error::Parse {
                line: rec.line,
                reason: format!("duplicate unit '{}'", rec.fields[0]),
            });
        }
    }

    Ok(out)
}

pub fn read_geometries<P: AsRef<Path>>(path: P) -> Result<HashMap<String, Geometry<f64>>> {
    parse_geometries(BufReader::new(File::open(path)?))
}

/// Parse a `unit,subregion` table, preserving row order.
pub fn parse_subregions<R: BufRead>(reader: R) -> Result<Vec<(String, String)>> {
    let recs = records(reader)?;
    require_header(&recs, "subregion")?;

    recs[1..]
        .iter()
        .map(|rec| match rec.fields.as_slice() {
            [unit, region] if !unit.is_empty() && !region.is_empty() => {
                Ok((unit.clone(), region.clone()))
            }
            _ => Err(Error::Parse {
                line: rec.line,
                reason: "expected 'unit,subregion'".into(),
            }),
        })
        .collect()
}

pub fn read_subregions<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>> {
    parse_subregions(BufReader::new(File::open(path)?))
}

/// Parse a site-by-taxon occurrence table.
///
/// Header: `site,taxon1,taxon2,...`. Any value greater than zero counts as
/// presence, so abundance tables are accepted too.
pub fn parse_community<R: BufRead>(reader: R) -> Result<CommunityMatrix> {
    let recs = records(reader)?;
    require_header(&recs, "community")?;

    let taxa: Vec<String> = recs[0].fields.iter().skip(1).cloned().collect();
    let body = &recs[1..];
    let mut sites = Vec::with_capacity(body.len());
    let mut presence = Array2::from_elem((body.len(), taxa.len()), false);

    for (i, rec) in body.iter().enumerate() {
        if rec.fields.len() != taxa.len() + 1 {
            return Err(Error::Parse {
                line: rec.line,
                reason: format!("expected {} fields, got {}", taxa.len() + 1, rec.fields.len()),
            });
        }
        sites.push(rec.fields[0].clone());
        for (j, field) in rec.fields[1..].iter().enumerate() {
            presence[[i, j]] = parse_f64(field, rec.line)? > 0.0;
        }
    }

    CommunityMatrix::new(sites, taxa, presence)
}

pub fn read_community<P: AsRef<Path>>(path: P) -> Result<CommunityMatrix> {
    parse_community(BufReader::new(File::open(path)?))
}
