//! Native GeoTIFF I/O built on the `tiff` crate.
//!
//! Supports single-band rasters with the ModelPixelScale/ModelTiepoint
//! georeferencing tags and the GDAL nodata tag. Data bands are always
//! written as 32-bit float; previews as 8-bit RGBA.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray32Float, RGBA8};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

/// Read a single-band GeoTIFF file
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode(BufReader::new(file))
}

/// Read a single-band GeoTIFF from memory
pub fn read_geotiff_from_buffer<T: RasterElement>(data: &[u8]) -> Result<Raster<T>> {
    decode(Cursor::new(data))
}

/// Write a raster as a 32-bit float GeoTIFF file
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode(raster, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Encode a raster as a 32-bit float GeoTIFF in memory
pub fn write_geotiff_to_buffer<T: RasterElement>(raster: &Raster<T>) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    encode(raster, &mut buf)?;
    Ok(buf.into_inner())
}

/// Write an interleaved RGBA buffer as a georeferenced 8-bit GeoTIFF
pub fn write_rgba_geotiff<P: AsRef<Path>>(
    rgba: &[u8],
    (rows, cols): (usize, usize),
    transform: &GeoTransform,
    path: P,
) -> Result<()> {
    if rgba.len() != rows * cols * 4 {
        return Err(Error::Other(format!(
            "RGBA buffer of {} bytes does not match a {rows}x{cols} image",
            rgba.len()
        )));
    }
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    {
        let mut encoder = TiffEncoder::new(&mut writer)?;
        let mut image = encoder.new_image::<RGBA8>(cols as u32, rows as u32)?;
        write_geo_tags(image.encoder(), transform)?;
        image.write_data(rgba)?;
    }
    writer.flush()?;
    Ok(())
}

macro_rules! cast_buffer {
    ($buf:expr) => {
        $buf.iter()
            .map(|&v| num_traits::cast(v).unwrap_or(T::default_nodata()))
            .collect()
    };
}

fn decode<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let (rows, cols) = (height as usize, width as usize);

    let data: Vec<T> = match decoder.read_image()? {
        DecodingResult::F32(buf) => cast_buffer!(buf),
        DecodingResult::F64(buf) => cast_buffer!(buf),
        DecodingResult::U8(buf) => cast_buffer!(buf),
        DecodingResult::U16(buf) => cast_buffer!(buf),
        DecodingResult::U32(buf) => cast_buffer!(buf),
        DecodingResult::I16(buf) => cast_buffer!(buf),
        DecodingResult::I32(buf) => cast_buffer!(buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "unsupported TIFF sample format".to_string(),
            ));
        }
    };

    let mut raster = Raster::from_vec(data, rows, cols)?;
    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    let nodata = decoder
        .get_tag_ascii_string(Tag::Unknown(GDAL_NODATA))
        .ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse::<f64>().ok())
        .and_then(num_traits::cast);
    raster.set_nodata(nodata);

    Ok(raster)
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::Unknown(MODEL_PIXEL_SCALE))
        .ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_TIEPOINT)).ok()?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }
    // tiepoint = [I, J, K, X, Y, Z]
    Some(GeoTransform::new(
        tiepoint[3] - tiepoint[0] * scale[0],
        tiepoint[4] + tiepoint[1] * scale[1],
        scale[0],
        -scale[1],
    ))
}

fn encode<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer)?;
    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| {
            if raster.is_nodata(v) {
                f32::NAN
            } else {
                num_traits::cast(v).unwrap_or(f32::NAN)
            }
        })
        .collect();

    let mut image = encoder.new_image::<Gray32Float>(cols as u32, rows as u32)?;
    write_geo_tags(image.encoder(), raster.transform())?;
    // Masked cells are always written as NaN
    image.encoder().write_tag(Tag::Unknown(GDAL_NODATA), "nan")?;

    image.write_data(&data)?;
    Ok(())
}

fn write_geo_tags<W, K>(dir: &mut DirectoryEncoder<'_, W, K>, gt: &GeoTransform) -> Result<()>
where
    W: Write + Seek,
    K: TiffKind,
{
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])?;
    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    dir.write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])?;
    // Version 1.1.0 with two keys: projected model, pixel-is-area
    let geokeys: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1];
    dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &geokeys[..])?;
    Ok(())
}
