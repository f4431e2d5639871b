//! End-to-end runs of the organizer against real files.
//!
//! Images are encoded with the `image` crate; PNG text chunks are spliced in
//! after `IHDR` the way generators write them.

use image::{DynamicImage, ImageFormat, RgbImage};
use sd_organizer::config::ToolConfig;
use sd_organizer::imaging::{ContainerReader, ImageKind};
use sd_organizer::organize::{self, OrganizeEvent, OrganizeOptions, SkipReason};
use sd_organizer::parameters::KeyStyle;
use sd_organizer::record::FileInfo;
use serde_json::Value;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const BLOCK: &str = "a lighthouse at dusk, oil painting\n\
Negative prompt: lowres\n\
Steps: 30, Sampler: DPM++ 2M, CFG scale: 6.5, Seed: 1234, Size: 832x1216, Model: SDXL Base";

/// Signature (8) + IHDR chunk (4 length + 4 type + 13 data + 4 CRC).
const IHDR_END: usize = 33;

fn encode(format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn write_png(path: &Path, parameters: Option<&str>) {
    let encoded = encode(ImageFormat::Png);
    let mut out = encoded[..IHDR_END].to_vec();
    if let Some(text) = parameters {
        let mut body = b"parameters\0".to_vec();
        body.extend_from_slice(text.as_bytes());
        let mut crc = flate2::Crc::new();
        crc.update(b"tEXt");
        crc.update(&body);
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(b"tEXt");
        out.extend_from_slice(&body);
        out.extend_from_slice(&crc.sum().to_be_bytes());
    }
    out.extend_from_slice(&encoded[IHDR_END..]);
    fs::write(path, out).unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn setup() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("input");
    let output = tmp.path().join("output");
    fs::create_dir_all(input.join("batch")).unwrap();
    (tmp, input, output)
}

#[test]
fn organizes_prompted_images_and_leaves_the_rest() {
    let (_tmp, input, output) = setup();
    let generated = input.join("batch").join("00007-1234.png");
    write_png(&generated, Some(BLOCK));
    write_png(&input.join("plain.png"), None);
    fs::write(input.join("photo.jpg"), encode(ImageFormat::Jpeg)).unwrap();
    fs::write(input.join("notes.txt"), "not an image").unwrap();

    let date = FileInfo::read(&generated, ImageKind::Png)
        .unwrap()
        .create_date;

    let (tx, rx) = std::sync::mpsc::channel();
    let report = organize::organize(
        &input,
        &output,
        &OrganizeOptions::default(),
        &ContainerReader,
        Some(tx),
    )
    .unwrap();

    assert_eq!(report.moved, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failed, 0);

    let dest_dir = output.join("sdxl base").join(&date);
    let moved = dest_dir.join("00007-1234.png");
    assert!(moved.exists());
    assert!(!generated.exists());
    assert!(input.join("plain.png").exists());
    assert!(input.join("photo.jpg").exists());
    assert!(input.join("notes.txt").exists());

    let sidecar = read_json(&dest_dir.join("00007-1234.json"));
    assert_eq!(sidecar["Prompt"], "a lighthouse at dusk, oil painting");
    assert_eq!(sidecar["Negative prompt"], "lowres");
    assert_eq!(sidecar["CFG scale"], "6.5");
    assert_eq!(sidecar["width"], "832");
    assert_eq!(sidecar["height"], "1216");
    assert_eq!(sidecar["file_type"], "png");
    assert_eq!(sidecar["create_date"], date.as_str());
    assert_eq!(
        sidecar["file_url"],
        moved.to_string_lossy().replace('\\', "/").as_str()
    );

    let events: Vec<OrganizeEvent> = rx.iter().collect();
    assert_eq!(events.len(), 3);
    assert!(events.iter().any(|e| matches!(
        e,
        OrganizeEvent::Skipped { reason: SkipReason::NoPrompt, .. }
    )));
}

#[test]
fn second_run_with_same_name_gets_suffix() {
    let (_tmp, input, output) = setup();
    let first = input.join("batch").join("gen.png");
    write_png(&first, Some(BLOCK));
    let date = FileInfo::read(&first, ImageKind::Png).unwrap().create_date;

    let options = OrganizeOptions::default();
    organize::organize(&input, &output, &options, &ContainerReader, None).unwrap();

    write_png(&first, Some(BLOCK));
    let report = organize::organize(&input, &output, &options, &ContainerReader, None).unwrap();
    assert_eq!(report.moved, 1);

    let dest_dir = output.join("sdxl base").join(&date);
    let mut names: Vec<String> = fs::read_dir(&dest_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 4);
    assert!(names.contains(&"gen.png".to_string()));
    assert!(names.contains(&"gen.json".to_string()));
    let suffixed: Vec<_> = names
        .iter()
        .filter(|n| n.starts_with("gen-") && n.ends_with(".png"))
        .collect();
    assert_eq!(suffixed.len(), 1);
    let stem = suffixed[0].trim_end_matches(".png");
    assert!(names.contains(&format!("{stem}.json")));
}

#[test]
fn organizing_the_output_tree_in_place_is_a_no_op() {
    let (_tmp, input, output) = setup();
    let image = input.join("batch").join("gen.png");
    write_png(&image, Some(BLOCK));
    let date = FileInfo::read(&image, ImageKind::Png).unwrap().create_date;

    let options = OrganizeOptions::default();
    organize::organize(&input, &output, &options, &ContainerReader, None).unwrap();
    let dest_dir = output.join("sdxl base").join(&date);
    let sidecar_before = fs::read_to_string(dest_dir.join("gen.json")).unwrap();

    let report = organize::organize(&output, &output, &options, &ContainerReader, None).unwrap();
    assert_eq!(report.moved, 0);
    assert_eq!(report.skipped, 1);

    let mut names: Vec<String> = fs::read_dir(&dest_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["gen.json", "gen.png"]);
    assert_eq!(
        fs::read_to_string(dest_dir.join("gen.json")).unwrap(),
        sidecar_before
    );
}

#[cfg(unix)]
#[test]
fn symlinked_images_are_organized() {
    let (tmp, input, output) = setup();
    let stash = tmp.path().join("stash");
    fs::create_dir_all(&stash).unwrap();
    let target = stash.join("gen.png");
    write_png(&target, Some(BLOCK));
    let date = FileInfo::read(&target, ImageKind::Png).unwrap().create_date;
    std::os::unix::fs::symlink(&target, input.join("link.png")).unwrap();

    let report = organize::organize(
        &input,
        &output,
        &OrganizeOptions::default(),
        &ContainerReader,
        None,
    )
    .unwrap();
    assert_eq!(report.moved, 1);
    assert!(output.join("sdxl base").join(&date).join("link.json").exists());
}

#[test]
fn lower_snake_case_keys_and_default_model() {
    let (_tmp, input, output) = setup();
    let image = input.join("untitled.png");
    write_png(&image, Some("a fox\nNegative prompt:\nSteps: 20, CFG scale: 7"));
    let date = FileInfo::read(&image, ImageKind::Png).unwrap().create_date;

    let mut config = ToolConfig::default();
    config.parameters.key_style = KeyStyle::LowerSnakeCase;
    config.organize.default_model = "misc".into();
    let options = OrganizeOptions::from_config(&config);

    organize::organize(&input, &output, &options, &ContainerReader, None).unwrap();

    let sidecar = read_json(&output.join("misc").join(&date).join("untitled.json"));
    assert_eq!(sidecar["prompt"], "a fox");
    assert_eq!(sidecar["negative"], "");
    assert_eq!(sidecar["steps"], "20");
    assert_eq!(sidecar["cfg_scale"], "7");
    assert!(sidecar.get("Prompt").is_none());
}

#[test]
fn plan_reports_without_touching_files() {
    let (_tmp, input, output) = setup();
    let image = input.join("gen.png");
    write_png(&image, Some(BLOCK));
    write_png(&input.join("blank.png"), None);

    let planned = organize::plan(
        &input,
        &output,
        &OrganizeOptions::default(),
        &ContainerReader,
    )
    .unwrap();

    assert_eq!(planned.len(), 2);
    assert!(planned.iter().any(|p| p.destination.is_none()));
    assert!(image.exists());
    assert!(!output.exists());
}
