//! Legacy VTK structured-points support
//!
//! Reads ASCII `STRUCTURED_POINTS` files into a [`Volume`]:
//! - `DIMENSIONS`, `SPACING` (or `ASPECT_RATIO`) and `ORIGIN` header keywords
//! - `POINT_DATA` followed by a `FIELD` block of named arrays, or a single
//!   `SCALARS` array with an optional `LOOKUP_TABLE` line
//! - values may wrap across any number of lines and are stored as `f32`
//!
//! Unrecognised keywords are skipped so newer headers still load.

use crate::{VolumeReader, VolumeWriter};
use isovox_core::{checked_point_count, Dimensions, Error, Point3f, Result, Volume};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;
use std::str::FromStr;

/// Values written per line by [`VtkWriter`]
const VALUES_PER_LINE: usize = 9;

/// Upper bound on values reserved before any have been read
const MAX_PREALLOCATED_VALUES: usize = 1 << 20;

/// Line iterator that remembers where it is for error reporting
struct LineCursor<R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> LineCursor<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.next() {
            Some(line) => {
                self.line_no += 1;
                Ok(Some(line?))
            }
            None => Ok(None),
        }
    }

    fn next_non_blank(&mut self) -> Result<Option<String>> {
        while let Some(line) = self.next_line()? {
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    fn context(&self) -> String {
        format!("line {}", self.line_no)
    }

    /// Read exactly `count` whitespace-separated values for `field`
    ///
    /// `first` is a line already pulled from the stream that holds the first values.
    fn read_values(
        &mut self,
        count: usize,
        field: &str,
        first: Option<String>,
    ) -> Result<Vec<f32>> {
        // the declared count is untrusted, grow past the cap only as values arrive
        let mut values = Vec::with_capacity(count.min(MAX_PREALLOCATED_VALUES));
        let mut pending = first;

        while values.len() < count {
            let line = match pending.take() {
                Some(line) => line,
                None => self.next_line()?.ok_or_else(|| {
                    Error::parse(
                        format!(
                            "unexpected end of file after {} of {} values",
                            values.len(),
                            count
                        ),
                        format!("field '{}', value #{}", field, values.len()),
                    )
                })?,
            };

            for token in line.split_whitespace() {
                if values.len() == count {
                    return Err(Error::parse(
                        format!("more than {} values", count),
                        format!("{}, field '{}'", self.context(), field),
                    ));
                }
                let value: f64 = token.parse().map_err(|_| {
                    Error::parse(
                        format!("malformed value '{}'", token),
                        format!("{}, field '{}', value #{}", self.context(), field, values.len()),
                    )
                })?;
                values.push(value as f32);
            }
        }

        Ok(values)
    }
}

/// Geometry gathered from the keywords that precede `POINT_DATA`
struct Header {
    dimensions: Option<Dimensions>,
    spacing: [f32; 3],
    origin: Point3f,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            dimensions: None,
            spacing: [1.0, 1.0, 1.0],
            origin: Point3f::origin(),
        }
    }
}

fn parse_token<T: FromStr>(token: Option<&str>, what: &str, context: &str) -> Result<T> {
    let token = token.ok_or_else(|| Error::parse(format!("missing {}", what), context))?;
    token
        .parse()
        .map_err(|_| Error::parse(format!("malformed {} '{}'", what, token), context))
}

fn parse_triple<'a, T: FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    keyword: &str,
    context: &str,
) -> Result<[T; 3]> {
    let x = parse_token(tokens.next(), &format!("{} x", keyword), context)?;
    let y = parse_token(tokens.next(), &format!("{} y", keyword), context)?;
    let z = parse_token(tokens.next(), &format!("{} z", keyword), context)?;
    Ok([x, y, z])
}

/// VTK structured-points reader
pub struct VtkReader;

impl VtkReader {
    /// Parse a volume from any buffered source
    pub fn read_from<R: BufRead>(reader: R) -> Result<Volume> {
        let mut cursor = LineCursor::new(reader);
        let mut header = Header::default();

        while let Some(line) = cursor.next_line()? {
            let mut tokens = line.split_whitespace();
            let Some(keyword) = tokens.next() else {
                continue;
            };
            let context = cursor.context();

            match keyword.to_ascii_uppercase().as_str() {
                "DIMENSIONS" => {
                    let dimensions: Dimensions = parse_triple(&mut tokens, "DIMENSIONS", &context)?;
                    if dimensions.iter().any(|&n| n == 0) {
                        return Err(Error::parse(
                            format!("DIMENSIONS must be positive, got {:?}", dimensions),
                            context,
                        ));
                    }
                    if checked_point_count(dimensions).is_none() {
                        return Err(Error::parse(
                            format!("DIMENSIONS {:?} overflow the point count", dimensions),
                            context,
                        ));
                    }
                    header.dimensions = Some(dimensions);
                }
                "SPACING" | "ASPECT_RATIO" => {
                    header.spacing = parse_triple(&mut tokens, "SPACING", &context)?;
                }
                "ORIGIN" => {
                    let [x, y, z] = parse_triple(&mut tokens, "ORIGIN", &context)?;
                    header.origin = Point3f::new(x, y, z);
                }
                "BINARY" => {
                    return Err(Error::UnsupportedFormat(
                        "binary VTK files are not supported".to_string(),
                    ));
                }
                "POINT_DATA" => {
                    let total: usize = parse_token(tokens.next(), "POINT_DATA count", &context)?;
                    return Self::read_point_data(&mut cursor, &header, total);
                }
                other => {
                    log::trace!("skipping '{}' at {}", other, context);
                }
            }
        }

        Err(Error::parse(
            "no POINT_DATA section found",
            format!("end of file at {}", cursor.context()),
        ))
    }

    fn read_point_data<R: BufRead>(
        cursor: &mut LineCursor<R>,
        header: &Header,
        total: usize,
    ) -> Result<Volume> {
        let context = cursor.context();
        let dimensions = header
            .dimensions
            .ok_or_else(|| Error::parse("POINT_DATA appears before DIMENSIONS", context.as_str()))?;

        let expected = checked_point_count(dimensions).ok_or_else(|| {
            Error::parse("DIMENSIONS overflow the point count", context.as_str())
        })?;
        if total != expected {
            return Err(Error::parse(
                format!(
                    "POINT_DATA count {} does not match DIMENSIONS {}x{}x{} = {}",
                    total, dimensions[0], dimensions[1], dimensions[2], expected
                ),
                context,
            ));
        }

        let mut volume = Volume::new(dimensions, header.spacing, header.origin)
            .map_err(|e| Error::parse(e.to_string(), context.as_str()))?;

        let block = cursor.next_non_blank()?.ok_or_else(|| {
            Error::parse("missing FIELD or SCALARS block after POINT_DATA", "end of file")
        })?;
        let mut tokens = block.split_whitespace();
        let keyword = tokens.next().unwrap_or_default().to_ascii_uppercase();
        let context = cursor.context();

        match keyword.as_str() {
            "FIELD" => {
                let _fieldset = tokens.next();
                let count: usize = parse_token(tokens.next(), "FIELD array count", &context)?;
                if count == 0 {
                    return Err(Error::parse("FIELD block declares no arrays", context));
                }
                for index in 0..count {
                    Self::read_field_array(cursor, &mut volume, total, index)?;
                }
            }
            "SCALARS" => {
                let name = tokens
                    .next()
                    .ok_or_else(|| Error::parse("missing SCALARS name", context.as_str()))?
                    .to_string();
                let _data_type = tokens.next();
                let components: usize = match tokens.next() {
                    Some(token) => parse_token(Some(token), "SCALARS component count", &context)?,
                    None => 1,
                };
                if components != 1 {
                    return Err(Error::parse(
                        format!(
                            "field '{}' has {} components, only 1 is supported",
                            name, components
                        ),
                        context,
                    ));
                }

                let mut first = cursor.next_non_blank()?;
                if first
                    .as_deref()
                    .and_then(|line| line.split_whitespace().next())
                    .is_some_and(|t| t.eq_ignore_ascii_case("LOOKUP_TABLE"))
                {
                    first = None;
                }
                let values = cursor.read_values(total, &name, first)?;
                Self::insert_field(&mut volume, name, values, &cursor.context())?;
            }
            _ => {
                return Err(Error::parse(
                    format!("expected FIELD or SCALARS after POINT_DATA, found '{}'", block.trim()),
                    context,
                ));
            }
        }

        Ok(volume)
    }

    fn read_field_array<R: BufRead>(
        cursor: &mut LineCursor<R>,
        volume: &mut Volume,
        total: usize,
        index: usize,
    ) -> Result<()> {
        let header = cursor.next_non_blank()?.ok_or_else(|| {
            Error::parse(
                format!("unexpected end of file before array #{}", index),
                "FIELD block",
            )
        })?;
        let context = format!("{}, array #{}", cursor.context(), index);
        let mut tokens = header.split_whitespace();

        let name = tokens
            .next()
            .ok_or_else(|| Error::parse("missing array name", context.as_str()))?
            .to_string();
        let components: usize = parse_token(tokens.next(), "component count", &context)?;
        let tuples: usize = parse_token(tokens.next(), "tuple count", &context)?;
        let data_type = tokens.next().unwrap_or("float");

        if components != 1 {
            return Err(Error::parse(
                format!("field '{}' has {} components, only 1 is supported", name, components),
                context,
            ));
        }
        if tuples != total {
            return Err(Error::parse(
                format!(
                    "field '{}' declares {} tuples but POINT_DATA has {}",
                    name, tuples, total
                ),
                context,
            ));
        }

        let values = cursor.read_values(total, &name, None)?;
        log::debug!("read field '{}' ({} x {})", name, values.len(), data_type);
        Self::insert_field(volume, name, values, &cursor.context())
    }

    fn insert_field(
        volume: &mut Volume,
        name: String,
        values: Vec<f32>,
        context: &str,
    ) -> Result<()> {
        if volume.has_field(&name) {
            return Err(Error::parse(format!("duplicate field '{}'", name), context));
        }
        volume
            .add_field(name, values)
            .map_err(|e| Error::parse(e.to_string(), context))
    }

    /// Parse a volume held in memory
    pub fn parse_str(text: &str) -> Result<Volume> {
        Self::read_from(text.as_bytes())
    }
}

impl VolumeReader for VtkReader {
    fn read_volume<P: AsRef<Path>>(path: P) -> Result<Volume> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::FileOpen {
            path: path.display().to_string(),
            source,
        })?;

        let volume = Self::read_from(BufReader::new(file))?;
        let [nx, ny, nz] = volume.dimensions();
        log::info!(
            "loaded {} ({}x{}x{}, fields: {})",
            path.display(),
            nx,
            ny,
            nz,
            volume.field_names().join(", ")
        );
        Ok(volume)
    }
}

/// VTK structured-points writer (ASCII, FIELD block)
pub struct VtkWriter;

impl VtkWriter {
    /// Write a volume to any sink
    pub fn write_to<W: Write>(volume: &Volume, mut writer: W) -> Result<()> {
        if volume.field_count() == 0 {
            return Err(Error::InvalidData(
                "cannot write a volume without fields".to_string(),
            ));
        }

        let [nx, ny, nz] = volume.dimensions();
        let [sx, sy, sz] = volume.spacing();
        let origin = volume.origin();

        writeln!(writer, "# vtk DataFile Version 3.0")?;
        writeln!(writer, "isovox structured volume")?;
        writeln!(writer, "ASCII")?;
        writeln!(writer, "DATASET STRUCTURED_POINTS")?;
        writeln!(writer, "DIMENSIONS {} {} {}", nx, ny, nz)?;
        writeln!(writer, "ORIGIN {} {} {}", origin.x, origin.y, origin.z)?;
        writeln!(writer, "SPACING {} {} {}", sx, sy, sz)?;
        writeln!(writer, "POINT_DATA {}", volume.point_count())?;
        writeln!(writer, "FIELD FieldData {}", volume.field_count())?;

        for name in volume.field_names() {
            let field = volume.field(name)?;
            writeln!(writer, "{} 1 {} float", name, field.values().len())?;
            for chunk in field.values().chunks(VALUES_PER_LINE) {
                let line: Vec<String> = chunk.iter().map(|v| v.to_string()).collect();
                writeln!(writer, "{}", line.join(" "))?;
            }
        }

        writer.flush()?;
        Ok(())
    }
}

impl VolumeWriter for VtkWriter {
    fn write_volume<P: AsRef<Path>>(volume: &Volume, path: P) -> Result<()> {
        let file = File::create(path)?;
        Self::write_to(volume, BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TWO_FIELDS: &str = "# vtk DataFile Version 3.0
Red sea temperature
ASCII
DATASET STRUCTURED_POINTS
DIMENSIONS 2 2 2
ORIGIN 0.5 -1 2
SPACING 1 2 0.25
POINT_DATA 8
FIELD FieldData 2
TEMP 1 8 double
0 1 2 3
4 5 6 7

SALT 1 8 float
0.5 0.5 0.5 0.5 1.5 1.5 1.5 1.5
";

    #[test]
    fn test_read_field_block() {
        let volume = VtkReader::parse_str(TWO_FIELDS).unwrap();

        assert_eq!(volume.dimensions(), [2, 2, 2]);
        assert_eq!(volume.spacing(), [1.0, 2.0, 0.25]);
        assert_eq!(volume.origin(), Point3f::new(0.5, -1.0, 2.0));
        assert_eq!(volume.field_names(), vec!["TEMP", "SALT"]);
        assert_eq!(volume.first_field_name(), Some("TEMP"));

        let temp = volume.field("TEMP").unwrap();
        assert_eq!(temp.values(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(volume.field("SALT").unwrap().get(1, 1, 1), Some(1.5));
    }

    #[test]
    fn test_defaults_without_spacing_and_origin() {
        let text = "DIMENSIONS 1 1 2\nPOINT_DATA 2\nFIELD f 1\nv 1 2 float\n1e-3 -2.5E+01\n";
        let volume = VtkReader::parse_str(text).unwrap();

        assert_eq!(volume.spacing(), [1.0, 1.0, 1.0]);
        assert_eq!(volume.origin(), Point3f::origin());
        let values = volume.field("v").unwrap().values();
        assert_relative_eq!(values[0], 0.001);
        assert_relative_eq!(values[1], -25.0);
    }

    #[test]
    fn test_scalars_block_with_lookup_table() {
        let text = "DIMENSIONS 2 1 1\nASPECT_RATIO 3 3 3\nPOINT_DATA 2\n\
                    SCALARS density float 1\nLOOKUP_TABLE default\n4\n8\n";
        let volume = VtkReader::parse_str(text).unwrap();

        assert_eq!(volume.spacing(), [3.0, 3.0, 3.0]);
        assert_eq!(volume.field("density").unwrap().values(), &[4.0, 8.0]);
    }

    #[test]
    fn test_scalars_block_without_lookup_table() {
        let text = "DIMENSIONS 2 1 1\nPOINT_DATA 2\nSCALARS density float\n4 8\n";
        let volume = VtkReader::parse_str(text).unwrap();
        assert_eq!(volume.field("density").unwrap().values(), &[4.0, 8.0]);
    }

    #[test]
    fn test_point_data_count_mismatch() {
        let text = "DIMENSIONS 2 2 2\nPOINT_DATA 9\nFIELD f 1\nv 1 9 float\n0 0 0 0 0 0 0 0 0\n";
        let err = VtkReader::parse_str(text).unwrap_err();

        match err {
            Error::Parse { reason, context } => {
                assert!(reason.contains("9"), "{}", reason);
                assert!(reason.contains("8"), "{}", reason);
                assert_eq!(context, "line 2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_overflowing_dimensions_rejected() {
        let text = "DIMENSIONS 4294967296 4294967296 2\nPOINT_DATA 8\n\
                    FIELD f 1\nv 1 8 float\n0\n";
        let err = VtkReader::parse_str(text).unwrap_err();

        match err {
            Error::Parse { reason, context } => {
                assert!(reason.contains("overflow"), "{}", reason);
                assert_eq!(context, "line 1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_huge_declared_count_fails_without_allocating() {
        let text = "DIMENSIONS 100000 100000 100\nPOINT_DATA 1000000000000\n\
                    FIELD f 1\nv 1 1000000000000 float\n0 1 2\n";
        let err = VtkReader::parse_str(text).unwrap_err();

        match err {
            Error::Parse { reason, context } => {
                assert!(reason.contains("3 of 1000000000000"), "{}", reason);
                assert!(context.contains("value #3"), "{}", context);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_point_data_before_dimensions() {
        let text = "POINT_DATA 8\nDIMENSIONS 2 2 2\n";
        assert!(matches!(VtkReader::parse_str(text), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_missing_point_data() {
        let text = "# vtk DataFile Version 3.0\nDIMENSIONS 2 2 2\nSPACING 1 1 1\n";
        let err = VtkReader::parse_str(text).unwrap_err();
        assert!(err.to_string().contains("POINT_DATA"));
    }

    #[test]
    fn test_field_tuple_mismatch_names_field() {
        let text = "DIMENSIONS 2 1 1\nPOINT_DATA 2\nFIELD f 1\npressure 1 3 float\n1 2 3\n";
        let err = VtkReader::parse_str(text).unwrap_err();
        assert!(err.to_string().contains("pressure"));
    }

    #[test]
    fn test_truncated_values() {
        let text = "DIMENSIONS 2 2 1\nPOINT_DATA 4\nFIELD f 1\nv 1 4 float\n1 2 3\n";
        let err = VtkReader::parse_str(text).unwrap_err();

        match err {
            Error::Parse { reason, context } => {
                assert!(reason.contains("3 of 4"), "{}", reason);
                assert!(context.contains("value #3"), "{}", context);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_value_reports_index() {
        let text = "DIMENSIONS 2 2 1\nPOINT_DATA 4\nFIELD f 1\nv 1 4 float\n1 2 x 4\n";
        let err = VtkReader::parse_str(text).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("'x'"), "{}", message);
        assert!(message.contains("value #2"), "{}", message);
        assert!(message.contains("line 5"), "{}", message);
    }

    #[test]
    fn test_extra_values_rejected() {
        let text = "DIMENSIONS 2 1 1\nPOINT_DATA 2\nFIELD f 1\nv 1 2 float\n1 2 3\n";
        assert!(VtkReader::parse_str(text).is_err());
    }

    #[test]
    fn test_multi_component_rejected() {
        let text = "DIMENSIONS 2 1 1\nPOINT_DATA 2\nFIELD f 1\nvel 3 2 float\n1 2 3 4 5 6\n";
        let err = VtkReader::parse_str(text).unwrap_err();
        assert!(err.to_string().contains("components"));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let text = "DIMENSIONS 1 1 1\nPOINT_DATA 1\nFIELD f 2\nv 1 1 float\n1\nv 1 1 float\n2\n";
        let err = VtkReader::parse_str(text).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_binary_rejected() {
        let text = "# vtk DataFile Version 3.0\ntitle\nBINARY\nDIMENSIONS 1 1 1\n";
        assert!(matches!(
            VtkReader::parse_str(text),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_unknown_keywords_skipped() {
        let text = "FUTURE_KEYWORD 1 2 3\nDIMENSIONS 1 1 1\nMETADATA\nPOINT_DATA 1\n\
                    FIELD f 1\nv 1 1 float\n42\nCELL_DATA 0\n";
        let volume = VtkReader::parse_str(text).unwrap();
        assert_eq!(volume.field("v").unwrap().values(), &[42.0]);
    }

    #[test]
    fn test_missing_file() {
        let err = VtkReader::read_volume("definitely/not/here.vtk").unwrap_err();
        assert!(matches!(err, Error::FileOpen { .. }));
    }

    #[test]
    fn test_writer_round_trip() {
        let original = VtkReader::parse_str(TWO_FIELDS).unwrap();

        let mut buffer = Vec::new();
        VtkWriter::write_to(&original, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let parsed = VtkReader::parse_str(&text).unwrap();

        assert_eq!(parsed, original);
    }

    #[test]
    fn test_writer_rejects_empty_volume() {
        let volume = Volume::new([1, 1, 1], [1.0, 1.0, 1.0], Point3f::origin()).unwrap();
        assert!(VtkWriter::write_to(&volume, Vec::<u8>::new()).is_err());
    }
}
