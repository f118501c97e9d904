//! Integration tests for the resource cache
//!
//! These tests cover:
//! - Material identity by shader identifier, not by name
//! - Image identity by case-insensitive path, with failures cached
//! - Sampler purity and key injectivity
//! - Texture identity and sharing through materials
//! - Host failures surfacing as fatal errors

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use gltfbridge_core::{NodeId, Plug};
use gltfbridge_export::gltf::{MagFilter, MinFilter, Sampler, WrapMode};
use gltfbridge_export::resources::{debug_hue, SURFACE_SHADER};
use gltfbridge_export::{ExportOptions, ExportResources, FilterKind, SamplerKey, TilingFlags};
use gltfbridge_host::{
    DecodedImage, Fault, FsImageSource, ImageDecodeError, ImageSource, MemoryScene, SceneDescription,
    SceneGraph,
};
use proptest::prelude::*;

/// Image source over a fixed set of files that records every access
#[derive(Default)]
struct RecordingSource {
    files: HashSet<PathBuf>,
    corrupt: HashSet<PathBuf>,
    exists_calls: Cell<usize>,
    decoded: RefCell<Vec<PathBuf>>,
}

impl RecordingSource {
    fn with_files(files: &[&str]) -> Self {
        Self {
            files: files.iter().map(PathBuf::from).collect(),
            ..Self::default()
        }
    }

    fn corrupt(mut self, path: &str) -> Self {
        self.files.insert(PathBuf::from(path));
        self.corrupt.insert(PathBuf::from(path));
        self
    }

    fn filesystem_accesses(&self) -> usize {
        self.exists_calls.get() + self.decoded.borrow().len()
    }
}

impl ImageSource for RecordingSource {
    fn exists(&self, path: &Path) -> bool {
        self.exists_calls.set(self.exists_calls.get() + 1);
        self.files.contains(path)
    }

    fn decode(&self, path: &Path) -> Result<DecodedImage, ImageDecodeError> {
        self.decoded.borrow_mut().push(path.to_path_buf());
        if self.corrupt.contains(path) {
            return Err(ImageDecodeError::UnsupportedFormat("Tga".to_string()));
        }
        Ok(DecodedImage {
            width: 16,
            height: 16,
            mime_type: "image/png".to_string(),
        })
    }
}

/// Helper to connect a shader to a new shading group
fn shading_group(scene: &mut MemoryScene, shader: NodeId, name: &str) -> NodeId {
    let group = scene.add_node(name, "shadingEngine");
    let out_color = Plug::new(shader, "outColor");
    scene.connect(&out_color, &Plug::new(group, SURFACE_SHADER)).unwrap();
    group
}

/// Helper to attach a file texture to a shader's color input
fn file_texture(scene: &mut MemoryScene, shader: NodeId, input: &str, path: &str) -> NodeId {
    let file = scene.add_node(format!("file_{}", scene.node_count()), "file");
    scene.set_attribute(file, "fileTextureName", path);
    scene
        .connect(&Plug::new(file, "outColor"), &Plug::new(shader, input))
        .unwrap();
    file
}

fn resources(source: RecordingSource) -> ExportResources<RecordingSource> {
    ExportResources::new(ExportOptions::default(), source).unwrap()
}

mod material_tests {
    use super::*;

    #[test]
    fn test_two_groups_one_shader() {
        let mut scene = MemoryScene::new();
        let shader = scene.add_node("lambert2", "lambert");
        let a = shading_group(&mut scene, shader, "lambert2SG");
        let b = shading_group(&mut scene, shader, "lambert2SG1");
        let mut resources = resources(RecordingSource::default());

        let first = resources.resolve_material(&scene, Some(a)).unwrap();
        let second = resources.resolve_material(&scene, Some(b)).unwrap();

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(resources.cache().materials().len(), 1);
    }

    #[test]
    fn test_identity_survives_rename() {
        let mut scene = MemoryScene::new();
        let shader = scene.add_node("lambert2", "lambert");
        let group = shading_group(&mut scene, shader, "lambert2SG");
        let mut resources = resources(RecordingSource::default());

        let before = resources.resolve_material(&scene, Some(group)).unwrap();
        scene.rename(shader, "skin_mat").unwrap();
        let after = resources.resolve_material(&scene, Some(group)).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_same_name_different_shaders() {
        let mut scene = MemoryScene::new();
        let a = scene.add_node("material", "lambert");
        let b = scene.add_node("material", "blinn");
        let group_a = shading_group(&mut scene, a, "sgA");
        let group_b = shading_group(&mut scene, b, "sgB");
        let mut resources = resources(RecordingSource::default());

        let first = resources.resolve_material(&scene, Some(group_a)).unwrap();
        let second = resources.resolve_material(&scene, Some(group_b)).unwrap();

        assert_ne!(first, second);
        assert_eq!(resources.cache().materials().len(), 2);
    }

    #[test]
    fn test_group_without_shader() {
        let mut scene = MemoryScene::new();
        let group = scene.add_node("emptySG", "shadingEngine");
        let mut resources = resources(RecordingSource::default());

        assert_eq!(resources.resolve_material(&scene, Some(group)).unwrap(), None);
        assert_eq!(resources.resolve_material(&scene, None).unwrap(), None);
    }

    #[test]
    fn test_unsupported_shader_cached_as_absent() {
        let mut scene = MemoryScene::new();
        let shader = scene.add_node("toon1", "rampShader");
        let group = shading_group(&mut scene, shader, "toonSG");
        let mut resources = resources(RecordingSource::default());

        assert_eq!(resources.resolve_material(&scene, Some(group)).unwrap(), None);
        assert_eq!(resources.resolve_material(&scene, Some(group)).unwrap(), None);
        assert_eq!(resources.cache().material_key_count(), 1);
        assert!(resources.cache().materials().is_empty());
    }

    #[test]
    fn test_identifier_failure_aborts() {
        let mut scene = MemoryScene::new();
        let shader = scene.add_node("lambert2", "lambert");
        let group = shading_group(&mut scene, shader, "lambert2SG");
        scene.inject_fault(Fault::Uuid(shader));
        let mut resources = resources(RecordingSource::default());

        let err = resources.resolve_material(&scene, Some(group)).unwrap_err();
        assert!(err.is_fatal());

        // Nothing was cached for the failed lookup
        scene.clear_faults();
        assert!(resources.resolve_material(&scene, Some(group)).unwrap().is_some());
    }

    #[test]
    fn test_default_material_for_unassigned_primitives() {
        let scene = MemoryScene::new();
        let mut bare = resources(RecordingSource::default());
        assert_eq!(bare.material_for_primitive(&scene, None).unwrap(), None);
        assert!(bare.cache().materials().is_empty());

        let options = ExportOptions {
            default_material: true,
            ..ExportOptions::default()
        };
        let mut resources = ExportResources::new(options, RecordingSource::default()).unwrap();
        let a = resources.material_for_primitive(&scene, None).unwrap();
        let b = resources.material_for_primitive(&scene, None).unwrap();
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn test_debug_materials_keyed_by_color() {
        let mut resources = resources(RecordingSource::default());

        let a = resources.resolve_debug_material(debug_hue(3));
        let b = resources.resolve_debug_material(debug_hue(3));
        let c = resources.resolve_debug_material(debug_hue(4));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(resources.cache().materials().len(), 2);
    }
}

mod image_tests {
    use super::*;

    #[test]
    fn test_case_insensitive_paths() {
        let source = RecordingSource::with_files(&["Textures/Skin.png", "textures/skin.PNG"]);
        let mut resources = resources(source);

        let a = resources.resolve_image("Textures/Skin.png");
        let b = resources.resolve_image("textures/skin.PNG");

        assert!(a.is_some());
        assert_eq!(a, b);
        assert_eq!(resources.cache().texturing().images().len(), 1);
    }

    #[test]
    fn test_missing_file_checked_once() {
        let source = RecordingSource::default();
        let mut resources = ExportResources::new(ExportOptions::default(), &source).unwrap();

        assert_eq!(resources.resolve_image("C:/project/missing.png"), None);
        assert_eq!(resources.resolve_image("C:/project/missing.png"), None);
        assert_eq!(resources.resolve_image("C:\\project\\missing.png"), None);
        assert_eq!(resources.cache().texturing().image_path_count(), 1);
        assert_eq!(source.exists_calls.get(), 1);
    }

    #[test]
    fn test_missing_spelling_does_not_hide_existing_file() {
        let source = RecordingSource::with_files(&["tex/skin.png"]);
        let mut resources = ExportResources::new(ExportOptions::default(), &source).unwrap();

        assert_eq!(resources.resolve_image("Tex/Skin.png"), None);
        let existing = resources.resolve_image("tex/skin.png");
        assert!(existing.is_some());
        assert_eq!(resources.resolve_image("Tex/Skin.png"), None);

        assert_eq!(resources.cache().texturing().image_path_count(), 2);
        assert_eq!(source.exists_calls.get(), 2);
        assert_eq!(source.decoded.borrow().len(), 1);
    }

    #[test]
    fn test_no_filesystem_access_after_failure() {
        let source = RecordingSource::default().corrupt("bad.tga");
        let mut resources = ExportResources::new(ExportOptions::default(), &source).unwrap();

        assert_eq!(resources.resolve_image("bad.tga"), None);
        let after_first = source.filesystem_accesses();
        assert_eq!(after_first, 2);

        assert_eq!(resources.resolve_image("bad.tga"), None);
        assert_eq!(resources.resolve_image("missing.png"), None);
        assert_eq!(resources.resolve_image("missing.png"), None);
        assert_eq!(source.filesystem_accesses(), after_first + 1);
    }

    #[test]
    fn test_decode_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("albedo.png");
        let corrupt = dir.path().join("broken.png");
        image::RgbaImage::from_pixel(3, 5, image::Rgba([10, 20, 30, 255]))
            .save(&png)
            .unwrap();
        std::fs::write(&corrupt, b"not an image at all").unwrap();

        let mut resources =
            ExportResources::new(ExportOptions::default(), FsImageSource::with_root(dir.path())).unwrap();

        let handle = resources.resolve_image("albedo.png").unwrap();
        let image = resources.cache().image(handle).unwrap();
        assert_eq!((image.width, image.height), (3, 5));
        assert_eq!(image.mime_type, "image/png");

        assert_eq!(resources.resolve_image("broken.png"), None);
        assert_eq!(resources.resolve_image("nowhere.png"), None);
    }
}

mod sampler_tests {
    use super::*;

    fn sampler(resources: &mut ExportResources<RecordingSource>, key: SamplerKey) -> Sampler {
        let handle = resources.resolve_sampler(key.filter, key.u, key.v);
        *resources.cache().sampler(handle).unwrap()
    }

    #[test]
    fn test_off_wrap_wrap() {
        let mut resources = resources(RecordingSource::default());
        let sampler = sampler(
            &mut resources,
            SamplerKey::new(FilterKind::Off, TilingFlags::WRAP, TilingFlags::WRAP),
        );

        assert_eq!(sampler.wrap_s, WrapMode::Repeat);
        assert_eq!(sampler.wrap_t, WrapMode::Repeat);
        assert_eq!(sampler.min_filter, MinFilter::Nearest);
        assert_eq!(sampler.mag_filter, MagFilter::Nearest);
    }

    #[test]
    fn test_box_mirror_wrap() {
        let mut resources = resources(RecordingSource::default());
        let sampler = sampler(
            &mut resources,
            SamplerKey::new(FilterKind::Box, TilingFlags::MIRROR, TilingFlags::WRAP),
        );

        assert_eq!(sampler.wrap_s, WrapMode::MirroredRepeat);
        assert_eq!(sampler.wrap_t, WrapMode::Repeat);
        assert_eq!(sampler.min_filter, MinFilter::LinearMipmapNearest);
        assert_eq!(sampler.mag_filter, MagFilter::Nearest);
    }

    fn any_filter() -> impl Strategy<Value = FilterKind> {
        proptest::sample::select(FilterKind::ALL.to_vec())
    }

    fn any_tiling() -> impl Strategy<Value = TilingFlags> {
        (0u8..=TilingFlags::MAX).prop_map(TilingFlags::from_bits_truncate)
    }

    fn any_key() -> impl Strategy<Value = SamplerKey> {
        (any_filter(), any_tiling(), any_tiling()).prop_map(|(f, u, v)| SamplerKey::new(f, u, v))
    }

    proptest! {
        #[test]
        fn prop_sampler_is_pure(key in any_key(), others in proptest::collection::vec(any_key(), 0..8)) {
            let mut fresh = resources(RecordingSource::default());
            let expected = sampler(&mut fresh, key);

            let mut busy = resources(RecordingSource::default());
            for other in others {
                busy.resolve_sampler(other.filter, other.u, other.v);
            }
            prop_assert_eq!(sampler(&mut busy, key), expected);
            prop_assert_eq!(expected, Sampler::from_key(key));
        }

        #[test]
        fn prop_distinct_keys_distinct_handles(a in any_key(), b in any_key()) {
            let mut resources = resources(RecordingSource::default());
            let ha = resources.resolve_sampler(a.filter, a.u, a.v);
            let hb = resources.resolve_sampler(b.filter, b.u, b.v);

            prop_assert_eq!(a == b, ha == hb);
            prop_assert_eq!(a == b, a.packed() == b.packed());
        }
    }
}

mod texture_tests {
    use super::*;

    #[test]
    fn test_materials_share_texture() {
        let mut scene = MemoryScene::new();
        let a = scene.add_node("wood_a", "lambert");
        let b = scene.add_node("wood_b", "standardSurface");
        file_texture(&mut scene, a, "color", "tex/wood.jpg");
        file_texture(&mut scene, b, "baseColor", "TEX/Wood.JPG");
        let group_a = shading_group(&mut scene, a, "sgA");
        let group_b = shading_group(&mut scene, b, "sgB");
        let mut resources = resources(RecordingSource::with_files(&["tex/wood.jpg"]));

        let ma = resources.resolve_material(&scene, Some(group_a)).unwrap().unwrap();
        let mb = resources.resolve_material(&scene, Some(group_b)).unwrap().unwrap();
        assert_ne!(ma, mb);

        let cache = resources.cache();
        let ta = cache.material(ma).unwrap().base_color_texture();
        let tb = cache.material(mb).unwrap().base_color_texture();
        assert!(ta.is_some());
        assert_eq!(ta, tb);
        assert_eq!(cache.texturing().textures().len(), 1);
        assert_eq!(cache.texturing().samplers().len(), 1);
    }

    #[test]
    fn test_missing_texture_keeps_material() {
        let mut scene = MemoryScene::new();
        let shader = scene.add_node("brick", "lambert");
        file_texture(&mut scene, shader, "color", "sourceimages/brick.png");
        let group = shading_group(&mut scene, shader, "brickSG");
        let mut resources = resources(RecordingSource::default());

        let material = resources.resolve_material(&scene, Some(group)).unwrap().unwrap();
        assert_eq!(resources.cache().material(material).unwrap().base_color_texture(), None);
        assert!(resources.cache().texturing().textures().is_empty());
    }

    #[test]
    fn test_texture_key_is_image_and_sampler() {
        let mut resources = resources(RecordingSource::with_files(&["a.png", "b.png"]));
        let a = resources.resolve_image("a.png").unwrap();
        let b = resources.resolve_image("b.png").unwrap();
        let wrap = resources.resolve_sampler(FilterKind::Mipmap, TilingFlags::WRAP, TilingFlags::WRAP);
        let clamp = resources.resolve_sampler(FilterKind::Mipmap, TilingFlags::empty(), TilingFlags::empty());

        let aw = resources.resolve_texture(a, wrap);
        assert_eq!(resources.resolve_texture(a, wrap), aw);
        assert_ne!(resources.resolve_texture(a, clamp), aw);
        assert_ne!(resources.resolve_texture(b, wrap), aw);
        assert_eq!(resources.cache().texturing().textures().len(), 3);
    }
}

mod scene_file_tests {
    use super::*;

    const SCENE: &str = r#"{
        "nodes": [
            { "name": "body", "type": "lambert", "attributes": { "color": [0.8, 0.6, 0.4] } },
            { "name": "bodySG", "type": "shadingEngine" },
            { "name": "headSG", "type": "shadingEngine" },
            { "name": "glass", "type": "phong", "attributes": { "transparency": [0.6, 0.6, 0.6] } },
            { "name": "glassSG", "type": "shadingEngine" }
        ],
        "connections": [
            { "from": "body.outColor", "to": "bodySG.surfaceShader" },
            { "from": "body.outColor", "to": "headSG.surfaceShader" },
            { "from": "glass.outColor", "to": "glassSG.surfaceShader" }
        ]
    }"#;

    #[test]
    fn test_tables_from_description() {
        let scene = SceneDescription::from_json(SCENE).unwrap().build().unwrap();
        let mut resources = resources(RecordingSource::default());

        let handles: Vec<_> = scene
            .nodes_of_type("shadingEngine")
            .map(|group| resources.resolve_material(&scene, Some(group)).unwrap().unwrap())
            .collect();
        assert_eq!(handles[0], handles[1]);
        assert_ne!(handles[0], handles[2]);

        let tables = serde_json::to_value(resources.cache().tables()).unwrap();
        let materials = tables["materials"].as_array().unwrap();
        assert_eq!(materials.len(), 2);
        assert_eq!(materials[0]["name"], "body");
        assert!(materials[0].get("alphaMode").is_none());
        assert_eq!(materials[1]["alphaMode"], "BLEND");
    }

    #[test]
    fn test_shader_type_read_from_scene() {
        let scene = SceneDescription::from_json(SCENE).unwrap().build().unwrap();
        let glass = scene.find_node("glass").unwrap();
        assert_eq!(scene.node_type(glass).unwrap(), "phong");
    }
}
