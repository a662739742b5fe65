//! End-to-end behaviour of the conversion router on synthetic frames.

use std::time::{Duration, Instant};

use uvcframe::capture::{Ownership, PixelFormat, StreamHandle};
use uvcframe::convert::{any_to_bgr, any_to_rgb, duplicate, yuyv_to_rgb, yuyv_to_uv, yuyv_to_y};
use uvcframe::{Error, Frame};

fn yuyv(width: u32, height: u32, data: Vec<u8>) -> Frame<'static> {
    let mut frame = Frame::from_owned(data, width, height, PixelFormat::Yuyv);
    frame.sequence = 1234;
    frame.capture_time = Some(Duration::from_micros(987_654));
    frame.capture_time_finished = Some(Instant::now());
    frame.source = Some(StreamHandle(1));
    frame
}

#[test]
fn mid_gray_collapses_chroma() {
    let src = yuyv(4, 1, [235, 128, 235, 128].repeat(2));
    let mut dst = Frame::allocate(0).unwrap();

    any_to_rgb(&src, &mut dst).unwrap();

    assert_eq!(dst.data(), &[235; 12]);
    assert_eq!(dst.format, PixelFormat::Rgb24);
    assert_eq!((dst.width, dst.height, dst.step), (4, 1, 12));
    assert_eq!(dst.sequence, src.sequence);
    assert_eq!(dst.capture_time, src.capture_time);
    assert_eq!(dst.capture_time_finished, src.capture_time_finished);
    assert_eq!(dst.source, src.source);
}

#[test]
fn saturation_never_wraps() {
    let src = yuyv(2, 1, vec![255, 255, 255, 0]);
    let mut rgb = Frame::allocate(0).unwrap();
    let mut bgr = Frame::allocate(0).unwrap();

    any_to_rgb(&src, &mut rgb).unwrap();
    any_to_bgr(&src, &mut bgr).unwrap();

    assert_eq!(rgb.data(), &[75, 255, 255, 75, 255, 255]);
    assert_eq!(bgr.data(), &[255, 255, 75, 255, 255, 75]);
    assert!(!rgb.data().contains(&0));
}

#[test]
fn dark_pixels_clamp_at_zero() {
    // Y = 0 with V = 0 pushes red far negative.
    let src = yuyv(2, 1, vec![0, 128, 0, 0]);
    let mut dst = Frame::allocate(0).unwrap();
    any_to_rgb(&src, &mut dst).unwrap();
    assert_eq!(&dst.data()[..3], &[0, 91, 0]);
}

#[test]
fn duplicate_round_trip() {
    let mut src = Frame::from_owned((0..=255).cycle().take(30).collect(), 5, 2, PixelFormat::Rgb24);
    src.set_metadata(b"uvc-header").unwrap();
    let mut dst = Frame::allocate(0).unwrap();

    duplicate(&src, &mut dst).unwrap();

    assert_eq!(dst.data_bytes(), src.data_bytes());
    assert_eq!(dst.data(), src.data());
    assert_eq!(dst.format, src.format);
    assert_eq!(dst.metadata(), Some(&b"uvc-header"[..]));
}

#[test]
fn borrowed_overflow_leaves_buffer_untouched() {
    let src = yuyv(6, 6, vec![16; 72]);
    let mut buf = [0x5A; 100];
    let mut dst = Frame::from_borrowed(&mut buf);

    let err = any_to_rgb(&src, &mut dst).unwrap_err();

    assert!(matches!(
        err,
        Error::OutOfMemory {
            requested: 108,
            available: 100
        }
    ));
    assert_eq!(dst.ownership(), Ownership::Borrowed);
    assert_eq!(dst.data_bytes(), 100);
    dst.release();
    assert!(buf.iter().all(|&b| b == 0x5A));
}

#[test]
fn format_mismatch_allocates_nothing() {
    let src = Frame::from_owned(vec![0; 12], 2, 2, PixelFormat::Bgr24);
    let mut dst = Frame::allocate(0).unwrap();

    let err = yuyv_to_rgb(&src, &mut dst).unwrap_err();

    assert!(matches!(
        err,
        Error::InvalidFormat {
            expected: PixelFormat::Yuyv,
            actual: PixelFormat::Bgr24
        }
    ));
    assert_eq!(dst.data_bytes(), 0);
    assert_eq!(dst.format, PixelFormat::Unknown);
}

#[test]
fn destination_follows_source_geometry() {
    let mut dst = Frame::allocate(0).unwrap();

    any_to_rgb(&yuyv(8, 4, vec![128; 64]), &mut dst).unwrap();
    assert_eq!(dst.data_bytes(), 96);

    any_to_rgb(&yuyv(4, 2, vec![128; 16]), &mut dst).unwrap();
    assert_eq!(dst.data_bytes(), 24);
    assert_eq!((dst.width, dst.height), (4, 2));
}

#[test]
fn source_is_not_modified() {
    let src = yuyv(4, 2, (0..16).map(|i| i * 16).collect());
    let snapshot = src.data().to_vec();
    let mut dst = Frame::allocate(0).unwrap();

    any_to_bgr(&src, &mut dst).unwrap();
    yuyv_to_y(&src, &mut dst).unwrap();
    yuyv_to_uv(&src, &mut dst).unwrap();

    assert_eq!(src.data(), &snapshot[..]);
    assert_eq!(src.format, PixelFormat::Yuyv);
}

#[test]
fn vga_frame_converts() {
    let src = yuyv(640, 480, [81, 90, 81, 240].repeat(640 * 480 / 2));
    let mut dst = Frame::allocate(640 * 480 * 3).unwrap();

    any_to_rgb(&src, &mut dst).unwrap();

    assert_eq!(dst.data_bytes(), 640 * 480 * 3);
    // r = 81 + 157, g = 81 - 67, b = 81 - 68
    assert_eq!(&dst.data()[..3], &[238, 14, 13]);
    assert_eq!(&dst.data()[dst.data_bytes() - 3..], &[238, 14, 13]);
}

#[test]
fn unrepresentable_step_is_rejected() {
    let mut src = yuyv(2, 2, vec![128; 8]);
    src.step = usize::MAX;
    let mut dst = Frame::allocate(0).unwrap();

    assert!(matches!(
        any_to_rgb(&src, &mut dst),
        Err(Error::Truncated { available: 8, .. })
    ));
    assert_eq!(dst.data_bytes(), 0);
    assert_eq!(dst.format, PixelFormat::Unknown);
}
