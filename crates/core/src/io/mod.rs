//! GeoTIFF reading and writing for scene bands, DEMs and output bands

mod native;

pub use native::{
    read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer,
    write_rgba_geotiff,
};
