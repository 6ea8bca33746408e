use argh::FromArgs;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use qoi::{
    decode::VecDecodeOutput, Channels, Colorspace, Header, QoiDecodeContext, QoiEncodeContext,
    TruncationPolicy,
};
use std::{fs::File, io::BufReader, str::FromStr};

/// QOI cli encoder and decoder.
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Encode(Encode),
    Decode(Decode),
}

/// Decodes a QOI image.
#[derive(FromArgs)]
#[argh(subcommand, name = "decode")]
struct Decode {
    /// output format (png, jpg, bmp)
    #[argh(option)]
    format: Format,

    /// fail on a truncated chunk stream instead of repeating the last pixel
    #[argh(switch)]
    strict: bool,

    /// the input QOI file
    #[argh(positional)]
    input: String,
    /// the output file
    #[argh(positional)]
    output: String,
}

/// Encodes an image as QOI.
#[derive(FromArgs)]
#[argh(subcommand, name = "encode")]
struct Encode {
    /// input format, optional (png, jpg, bmp)
    #[argh(option)]
    format: Option<Format>,

    /// colorspace stored in the header (srgb, linear), defaults to srgb
    #[argh(option, default = "ColorspaceArg(Colorspace::Srgb)")]
    colorspace: ColorspaceArg,

    /// the input file. May be a PNG, JPG, BMP or TIFF.
    #[argh(positional)]
    input: String,
    /// the output file
    #[argh(positional)]
    output: String,
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Png,
    Jpg,
    Bmp,
}

impl Format {
    fn image_format(self) -> ImageFormat {
        match self {
            Format::Png => ImageFormat::Png,
            Format::Jpg => ImageFormat::Jpeg,
            Format::Bmp => ImageFormat::Bmp,
        }
    }
}

impl FromStr for Format {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        #[rustfmt::skip]
        let Some(format) = s.eq_ignore_ascii_case("png").then_some(Format::Png)
               .or_else(|| s.eq_ignore_ascii_case("jpg").then_some(Format::Jpg))
               .or_else(|| s.eq_ignore_ascii_case("bmp").then_some(Format::Bmp))
        else { return Err("invalid string"); };

        Ok(format)
    }
}

struct ColorspaceArg(Colorspace);

impl FromStr for ColorspaceArg {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("srgb") {
            Ok(ColorspaceArg(Colorspace::Srgb))
        } else if s.eq_ignore_ascii_case("linear") {
            Ok(ColorspaceArg(Colorspace::Linear))
        } else {
            Err("expected srgb or linear")
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Cli { command } = argh::from_env();

    match command {
        Command::Encode(options) => encode(options),
        Command::Decode(options) => decode(options),
    }
}

fn encode(options: Encode) -> Result<(), Box<dyn std::error::Error>> {
    let Encode {
        format,
        colorspace: ColorspaceArg(colorspace),
        input,
        output,
    } = options;

    let image = match format {
        Some(format) => image::io::Reader::with_format(
            BufReader::new(File::open(&input)?),
            format.image_format(),
        )
        .decode()?,
        None => image::io::Reader::open(&input)?
            .with_guessed_format()?
            .decode()?,
    };

    let width = image.width();
    let height = image.height();
    let (channels, raw) = if image.color().has_alpha() {
        (Channels::Rgba, image.into_rgba8().into_raw())
    } else {
        (Channels::Rgb, image.into_rgb8().into_raw())
    };

    println!(
        "Encoding {width}x{height} image from `{input}` ({} channels, {colorspace:?})",
        channels.count()
    );

    let header = Header::new(width, height, channels, colorspace)?;
    let mut v = Vec::with_capacity(qoi::encode::max_encoded_len(&header));
    QoiEncodeContext::encode_to_vec(&header, &raw, &mut v)?;

    std::fs::write(&output, &v)?;
    println!(
        "Written {} bytes to `{output}` ({:.1}% of raw size)",
        v.len(),
        v.len() as f64 * 100.0 / raw.len() as f64
    );

    Ok(())
}

fn decode(options: Decode) -> Result<(), Box<dyn std::error::Error>> {
    let Decode {
        format,
        strict,
        input,
        output,
    } = options;

    let qoi_input = std::fs::read(&input)?;

    println!("Decoding `{input}`");

    let policy = if strict {
        TruncationPolicy::Strict
    } else {
        TruncationPolicy::Lenient
    };
    let header = Header::from_bytes(&qoi_input)?;
    let Header {
        width,
        height,
        channels,
        colorspace,
    } = header;

    let mut v = Vec::with_capacity(header.output_len(channels));
    let (decoded, _) = QoiDecodeContext::with_policy(policy)
        .decode_with_state(&qoi_input, VecDecodeOutput::new(&mut v, channels))?;

    println!(
        "Decoded {width}x{height} image ({} channels, {colorspace:?})",
        channels.count()
    );
    let pixel_count = header.pixel_count();
    if decoded < pixel_count {
        println!(
            "Warning: stream is truncated, only {decoded} of {pixel_count} pixels were present"
        );
    }

    let image = match channels {
        Channels::Rgb => DynamicImage::ImageRgb8(
            RgbImage::from_vec(width, height, v).ok_or("failed to create image")?,
        ),
        Channels::Rgba => DynamicImage::ImageRgba8(
            RgbaImage::from_vec(width, height, v).ok_or("failed to create image")?,
        ),
    };

    let image = match (format, channels) {
        // JPEG and BMP writers don't take every alpha layout, drop it for them
        (Format::Jpg | Format::Bmp, Channels::Rgba) => DynamicImage::ImageRgb8(image.into_rgb8()),
        _ => image,
    };
    image.save_with_format(&output, format.image_format())?;

    println!("Written {width}x{height} image to `{output}`");

    Ok(())
}
