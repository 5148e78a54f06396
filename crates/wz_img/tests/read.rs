use pretty_assertions::assert_eq;
use tracing::info;
use tracing_test::traced_test;
use wz_img::{
    decode, encode,
    error::{Error, Result},
    CompressionMethod, ImgReader, ImgWriterOptions,
};
use wz_node::{Binary, Canvas, Container, Node, Vector2};

fn sample_unit() -> Container {
    let mut canvas = Canvas::new(2, 1, vec![0x78, 0x9C, 0x01, 0x02]);
    canvas.children = Container::new()
        .with("origin", Node::Vector2(Vector2::new(-1, 7)))
        .with("delay", Node::Int32(150));

    Container::new()
        .with(
            "info",
            Container::new()
                .with("icon", Node::Canvas(canvas))
                .with("price", Node::Int32(50))
                .with("slotMax", Node::Int16(100))
                .with("cash", Node::Int64(-1))
                .with("rate", Node::Float32(0.25))
                .with("ratio", Node::Float64(1.0 / 3.0))
                .into(),
        )
        .with("name", Node::String("Red Potion \u{2665}".into()))
        .with("alias", Node::Link("info/icon".into()))
        .with("empty", Node::Null)
        .with(
            "use",
            Node::Binary(Binary {
                length: 1200,
                frequency: 44100,
                payload: b"ID3".to_vec(),
            }),
        )
}

#[traced_test]
#[test]
fn decode_encoded_unit_with_every_kind() -> Result<()> {
    for compression in [CompressionMethod::None, CompressionMethod::Zlib] {
        info!("testing {compression:?}");
        let options = ImgWriterOptions::builder().compression(compression).build();

        let bytes = encode(&sample_unit(), options)?;
        let decoded = decode(&bytes)?;
        assert_eq!(decoded, sample_unit());

        let names = decoded.keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(names, vec!["info", "name", "alias", "empty", "use"]);

        assert_eq!(encode(&decoded, options)?, bytes);
    }

    Ok(())
}

#[traced_test]
#[test]
fn reader_exposes_header() -> Result<()> {
    let bytes = encode(&sample_unit(), ImgWriterOptions::default())?;
    let mut reader = ImgReader::new(std::io::Cursor::new(&bytes))?;

    assert_eq!(reader.header().compression, CompressionMethod::Zlib);
    assert_eq!(reader.header().body_size as usize, bytes.len() - 24);
    assert_eq!(
        reader.body()?.len(),
        reader.header().uncompressed_size as usize
    );

    Ok(())
}

#[traced_test]
#[test]
fn corrupted_compressed_body_is_rejected() -> Result<()> {
    let mut bytes = encode(&sample_unit(), ImgWriterOptions::default())?;
    let middle = 24 + (bytes.len() - 24) / 2;
    bytes[middle] ^= 0xFF;

    assert!(matches!(
        decode(&bytes),
        Err(Error::InvalidUnit(_) | Error::ChecksumMismatch { .. })
    ));

    Ok(())
}

#[traced_test]
#[test]
fn duplicate_names_are_rejected() {
    #[rustfmt::skip]
    let body: Vec<u8> = vec![
        0x02, 0x00, 0x00, 0x00,
        0x01, 0x00, 0x61, 0x00,
        0x01, 0x00, 0x61, 0x00,
    ];
    let checksum = crc::Crc::<u32>::new(&crc::CRC_32_BZIP2).checksum(&body);

    let mut bytes = b"WZIM".to_vec();
    for field in [1u32, 0, body.len() as u32, body.len() as u32, checksum] {
        bytes.extend_from_slice(&field.to_le_bytes());
    }
    bytes.extend_from_slice(&body);

    assert!(matches!(decode(&bytes), Err(Error::InvalidUnit(_))));
}
