use std::fs;
use std::path::Path;

use crate::error::{UploadError, UploadResult};
use crate::table::{Column, ColumnData, Table};

const BLOCK_SIZE: usize = 2880;
const CARD_SIZE: usize = 80;

/// Read one binary-table HDU from a FITS file.
///
/// `extension` is the HDU index counted from the primary HDU (0); `None`
/// selects the first BINTABLE extension in the file.
pub fn read_binary_table(path: &Path, extension: Option<usize>) -> UploadResult<Table> {
    let bytes = fs::read(path)?;

    let mut offset = 0;
    let mut hdu_index = 0;
    while offset < bytes.len() {
        let header = Header::parse(&bytes, offset, path)?;
        let data_start = offset + header.block_count * BLOCK_SIZE;
        let data_len = header.data_len(path)?;
        let is_bintable = header.string_value("XTENSION").as_deref() == Some("BINTABLE");

        let selected = match extension {
            Some(index) => index == hdu_index,
            None => is_bintable,
        };
        if selected {
            if !is_bintable {
                return Err(UploadError::format(
                    path,
                    format!("HDU {hdu_index} is not a binary table"),
                ));
            }
            let data = bytes.get(data_start..data_start + data_len).ok_or_else(|| {
                UploadError::format(path, format!("HDU {hdu_index} data is truncated"))
            })?;
            return parse_bintable(&header, data, path);
        }

        offset = data_start + data_len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        hdu_index += 1;
    }

    match extension {
        Some(index) => Err(UploadError::format(
            path,
            format!("extension {index} not found, file has {hdu_index} HDUs"),
        )),
        None => Err(UploadError::format(path, "no binary table HDU found")),
    }
}

/// One HDU header: keyword cards up to END, plus the padded block count.
struct Header {
    cards: Vec<(String, String)>,
    block_count: usize,
}

impl Header {
    fn parse(bytes: &[u8], offset: usize, path: &Path) -> UploadResult<Self> {
        let mut cards = Vec::new();
        let mut card_start = offset;
        loop {
            let card = bytes.get(card_start..card_start + CARD_SIZE).ok_or_else(|| {
                UploadError::format(path, "header ended without an END card")
            })?;

            let keyword = String::from_utf8_lossy(&card[..8]).trim_end().to_string();
            if keyword == "END" {
                break;
            }
            if card[8..10] == *b"= " {
                let value = parse_card_value(&card[10..]);
                cards.push((keyword, value));
            }
            card_start += CARD_SIZE;
        }

        let header_len = card_start + CARD_SIZE - offset;
        Ok(Self {
            cards,
            block_count: header_len.div_ceil(BLOCK_SIZE),
        })
    }

    fn string_value(&self, keyword: &str) -> Option<String> {
        self.cards
            .iter()
            .find(|(key, _)| key == keyword)
            .map(|(_, value)| value.clone())
    }

    fn int_value(&self, keyword: &str) -> Option<i64> {
        self.string_value(keyword)
            .and_then(|value| value.parse().ok())
    }

    fn required_int(&self, keyword: &str, path: &Path) -> UploadResult<i64> {
        self.int_value(keyword)
            .ok_or_else(|| UploadError::format(path, format!("missing header keyword {keyword}")))
    }

    /// Byte length of the HDU data unit, before block padding.
    fn data_len(&self, path: &Path) -> UploadResult<usize> {
        let bitpix = self.required_int("BITPIX", path)?.unsigned_abs() as usize;
        let naxis = self.required_int("NAXIS", path)?;
        if naxis == 0 {
            return Ok(0);
        }

        let mut elements: usize = 1;
        for axis in 1..=naxis {
            elements *= self.required_int(&format!("NAXIS{axis}"), path)? as usize;
        }
        let pcount = self.int_value("PCOUNT").unwrap_or(0) as usize;
        let gcount = self.int_value("GCOUNT").unwrap_or(1) as usize;
        Ok(bitpix / 8 * gcount * (pcount + elements))
    }
}

/// Value portion of a keyword card: quoted strings lose their quotes and
/// trailing blanks, everything else is cut at the comment slash and trimmed.
fn parse_card_value(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim_start();
    if let Some(rest) = trimmed.strip_prefix('\'') {
        match rest.find('\'') {
            Some(end) => rest[..end].trim_end().to_string(),
            None => rest.trim_end().to_string(),
        }
    } else {
        trimmed
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}

/// Decoded TFORM element type with its byte width in the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldType {
    Float64,
    Float32,
    Int64,
    Int32,
    Int16,
    Ascii(usize),
}

impl FieldType {
    fn byte_width(self) -> usize {
        match self {
            Self::Float64 | Self::Int64 => 8,
            Self::Float32 | Self::Int32 => 4,
            Self::Int16 => 2,
            Self::Ascii(width) => width,
        }
    }
}

fn parse_tform(tform: &str, path: &Path) -> UploadResult<FieldType> {
    let digits: String = tform.chars().take_while(char::is_ascii_digit).collect();
    let repeat: usize = if digits.is_empty() {
        1
    } else {
        digits.parse().map_err(|_| {
            UploadError::format(path, format!("invalid TFORM repeat count: {tform}"))
        })?
    };
    let code = tform[digits.len()..].trim();

    let field_type = match code {
        "D" => FieldType::Float64,
        "E" => FieldType::Float32,
        "K" => FieldType::Int64,
        "J" => FieldType::Int32,
        "I" => FieldType::Int16,
        "A" => return Ok(FieldType::Ascii(repeat)),
        other => {
            return Err(UploadError::format(
                path,
                format!("unsupported TFORM code: {other:?} in {tform}"),
            ));
        }
    };
    if repeat != 1 {
        return Err(UploadError::format(
            path,
            format!("array cells are unsupported: TFORM {tform}"),
        ));
    }
    Ok(field_type)
}

fn parse_bintable(header: &Header, data: &[u8], path: &Path) -> UploadResult<Table> {
    let row_width = header.required_int("NAXIS1", path)? as usize;
    let row_count = header.required_int("NAXIS2", path)? as usize;
    let field_count = header.required_int("TFIELDS", path)? as usize;

    let mut names = Vec::with_capacity(field_count);
    let mut types = Vec::with_capacity(field_count);
    for field in 1..=field_count {
        let name = header
            .string_value(&format!("TTYPE{field}"))
            .unwrap_or_else(|| format!("COL{field}"));
        let tform = header.string_value(&format!("TFORM{field}")).ok_or_else(|| {
            UploadError::format(path, format!("missing header keyword TFORM{field}"))
        })?;
        names.push(name);
        types.push(parse_tform(&tform, path)?);
    }

    let declared_width: usize = types.iter().map(|t| t.byte_width()).sum();
    if declared_width != row_width {
        return Err(UploadError::format(
            path,
            format!("TFORM widths sum to {declared_width}, NAXIS1 is {row_width}"),
        ));
    }
    if data.len() < row_width * row_count {
        return Err(UploadError::format(path, "binary table data is truncated"));
    }

    let mut columns: Vec<ColumnData> = types
        .iter()
        .map(|field_type| match field_type {
            FieldType::Float64 | FieldType::Float32 => {
                ColumnData::Float(Vec::with_capacity(row_count))
            }
            FieldType::Int64 | FieldType::Int32 | FieldType::Int16 => {
                ColumnData::Int(Vec::with_capacity(row_count))
            }
            FieldType::Ascii(_) => ColumnData::Text(Vec::with_capacity(row_count)),
        })
        .collect();

    for row in 0..row_count {
        let mut cell_start = row * row_width;
        for (column, field_type) in columns.iter_mut().zip(&types) {
            let cell = &data[cell_start..cell_start + field_type.byte_width()];
            decode_cell(column, *field_type, cell);
            cell_start += field_type.byte_width();
        }
    }

    let columns = names
        .into_iter()
        .zip(columns)
        .map(|(name, data)| Column::new(name, data))
        .collect();
    Table::new(columns)
}

fn decode_cell(column: &mut ColumnData, field_type: FieldType, cell: &[u8]) {
    match (column, field_type) {
        (ColumnData::Float(values), FieldType::Float64) => {
            values.push(f64::from_be_bytes([
                cell[0], cell[1], cell[2], cell[3], cell[4], cell[5], cell[6], cell[7],
            ]));
        }
        (ColumnData::Float(values), FieldType::Float32) => {
            values.push(f64::from(f32::from_be_bytes([
                cell[0], cell[1], cell[2], cell[3],
            ])));
        }
        (ColumnData::Int(values), FieldType::Int64) => {
            values.push(i64::from_be_bytes([
                cell[0], cell[1], cell[2], cell[3], cell[4], cell[5], cell[6], cell[7],
            ]));
        }
        (ColumnData::Int(values), FieldType::Int32) => {
            values.push(i64::from(i32::from_be_bytes([
                cell[0], cell[1], cell[2], cell[3],
            ])));
        }
        (ColumnData::Int(values), FieldType::Int16) => {
            values.push(i64::from(i16::from_be_bytes([cell[0], cell[1]])));
        }
        (ColumnData::Text(values), FieldType::Ascii(_)) => {
            let text = String::from_utf8_lossy(cell);
            values.push(text.trim_end_matches([' ', '\0']).to_string());
        }
        // Column storage is derived from the same field type above.
        _ => unreachable!("column storage mismatches field type"),
    }
}
