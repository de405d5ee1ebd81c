//! Frame planning: pose + asset bindings -> ordered draw list.
//!
//! Nothing in here touches the GPU; `H` is whatever handle the texture
//! loader produces, so plans can be built and checked in tests.

use std::f32::consts::FRAC_PI_2;

use asset::{MeshAsset, TextureCache, TextureLoader};
use corelib::animation::{Expression, Pose};
use corelib::camera::{Camera, CameraPan};
use corelib::transform::Transform;
use corelib::{Mat4, Vec3};

/// How the face overlay shows the alternate expression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverlayMode {
    /// Bind the alternate texture.
    #[default]
    Swap,
    /// Skip the overlay draw entirely.
    Hide,
}

/// Fixed placement of the model, its face overlay and the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneLayout {
    /// Applied before the dance rotation to stand the model upright (Z-up).
    pub base_rotation: Vec3,
    /// Overlay position in the model's local frame.
    pub overlay_offset: Vec3,
    /// Overlay orientation in the model's local frame.
    pub overlay_rotation: Vec3,
    /// Side length of the overlay quad.
    pub overlay_size: f32,
    pub overlay_mode: OverlayMode,
    /// `None` keeps the stage camera still.
    pub camera_pan: Option<CameraPan>,
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self {
            base_rotation: Vec3::new(FRAC_PI_2, 0.0, 0.0),
            overlay_offset: Vec3::new(0.0, 0.5, 2.95),
            overlay_rotation: Vec3::new(-FRAC_PI_2, 0.0, 0.0),
            overlay_size: 2.5,
            overlay_mode: OverlayMode::Swap,
            camera_pan: None,
        }
    }
}

impl SceneLayout {
    /// Overlay transform relative to the model.
    pub fn overlay_local(&self) -> Transform {
        Transform::from_translation_rotation(self.overlay_offset, self.overlay_rotation)
    }

    /// Stage camera at normalized clip time `t`.
    pub fn camera(&self, aspect: f32, t: f32) -> Camera {
        let camera = Camera::stage(aspect);
        match &self.camera_pan {
            Some(pan) => camera.panned(pan, t),
            None => camera,
        }
    }
}

/// What a draw samples: a loaded texture, or the white texture tinted by a color.
#[derive(Clone, Debug, PartialEq)]
pub enum Binding<H> {
    Texture(H),
    FlatColor([f32; 3]),
}

impl<H> Binding<H> {
    /// Color multiplied with the sampled texel.
    pub fn tint(&self) -> [f32; 4] {
        match self {
            Binding::Texture(_) => [1.0, 1.0, 1.0, 1.0],
            Binding::FlatColor([r, g, b]) => {
                [srgb_to_linear(*r), srgb_to_linear(*g), srgb_to_linear(*b), 1.0]
            }
        }
    }
}

/// `Kd` values are display colors; the sRGB surface expects linear output.
fn srgb_to_linear(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawTarget {
    /// Index into `MeshAsset::groups`.
    Group(usize),
    Overlay,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawCommand<H> {
    pub target: DrawTarget,
    pub binding: Binding<H>,
    pub model: Mat4,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FramePlan<H> {
    pub draws: Vec<DrawCommand<H>>,
}

/// One binding per mesh group, in group order. Resolved once after load.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialBindings<H> {
    pub per_group: Vec<Binding<H>>,
}

impl<H: Clone> MaterialBindings<H> {
    /// Resolves each group's diffuse texture through `cache`. A texture that
    /// fails to load only downgrades its own material to flat color.
    pub fn resolve<L>(asset: &MeshAsset, cache: &mut TextureCache<H>, loader: &mut L) -> Self
    where
        L: TextureLoader<Handle = H> + ?Sized,
    {
        let per_group = asset
            .groups
            .iter()
            .map(|group| {
                let Some(material) = asset.material_for(group) else {
                    return Binding::FlatColor([1.0, 1.0, 1.0]);
                };
                let Some(path) = material.diffuse_texture.as_deref() else {
                    return Binding::FlatColor(material.diffuse);
                };
                match cache.resolve(path, loader) {
                    Ok(handle) => Binding::Texture(handle),
                    Err(e) => {
                        log::warn!(
                            "Material '{}' falls back to flat color {:?}: {e}",
                            material.name,
                            material.diffuse
                        );
                        Binding::FlatColor(material.diffuse)
                    }
                }
            })
            .collect();
        Self { per_group }
    }
}

/// Face textures, indexed by [`Expression`].
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayTextures<H> {
    pub primary: H,
    pub alternate: H,
}

impl<H> OverlayTextures<H> {
    pub fn for_expression(&self, expression: Expression) -> &H {
        match expression {
            Expression::Primary => &self.primary,
            Expression::Alternate => &self.alternate,
        }
    }
}

/// Material groups first, in asset order, then the overlay quad. In
/// [`OverlayMode::Hide`] the overlay is left out while the alternate
/// expression is active.
pub fn plan_frame<H: Clone>(
    pose: &Pose,
    layout: &SceneLayout,
    bindings: &MaterialBindings<H>,
    overlay: &OverlayTextures<H>,
) -> FramePlan<H> {
    let model = pose.model_matrix(layout.base_rotation);

    let mut draws: Vec<DrawCommand<H>> = bindings
        .per_group
        .iter()
        .enumerate()
        .map(|(i, binding)| DrawCommand {
            target: DrawTarget::Group(i),
            binding: binding.clone(),
            model,
        })
        .collect();

    let hidden =
        layout.overlay_mode == OverlayMode::Hide && pose.expression == Expression::Alternate;
    if !hidden {
        draws.push(DrawCommand {
            target: DrawTarget::Overlay,
            binding: Binding::Texture(overlay.for_expression(pose.expression).clone()),
            model: layout.overlay_local().matrix_in(model),
        });
    }

    FramePlan { draws }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use asset::obj::load_obj_from_str;
    use asset::{Material, MaterialCatalog};
    use corelib::animation::AnimationClip;
    use corelib::{CoreError, CoreResult};

    use super::*;

    /// Loads every path except those containing "missing".
    #[derive(Default)]
    struct FakeLoader {
        loads: Vec<String>,
    }

    impl TextureLoader for FakeLoader {
        type Handle = String;

        fn load(&mut self, path: &Path) -> CoreResult<String> {
            let name = path.display().to_string();
            if name.contains("missing") {
                return Err(CoreError::TextureLoad {
                    path: path.to_path_buf(),
                    reason: "no such file".to_string(),
                });
            }
            self.loads.push(name.clone());
            Ok(name)
        }
    }

    fn two_material_asset() -> MeshAsset {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nusemtl Skin\nf 1 2 3\nusemtl Leaf\nf 1 2 3\nusemtl Peel\nf 3 2 1\n";
        let doc = asset::obj::parse_obj(std::io::Cursor::new(src), "t.obj").expect("parse");
        let mut catalog = MaterialCatalog::new();
        let mut skin = Material::new("Skin");
        skin.diffuse = [0.8, 0.6, 0.5];
        skin.diffuse_texture = Some("models/missing_tex.png".into());
        catalog.insert(skin);
        let mut leaf = Material::new("Leaf");
        leaf.diffuse = [0.1, 0.7, 0.1];
        leaf.diffuse_texture = Some("models/leaf.png".into());
        catalog.insert(leaf);
        let mut peel = Material::new("Peel");
        peel.diffuse_texture = Some("models/./leaf.png".into());
        catalog.insert(peel);
        doc.into_asset(catalog)
    }

    fn overlay() -> OverlayTextures<String> {
        OverlayTextures {
            primary: "smile_1".to_string(),
            alternate: "smile_2".to_string(),
        }
    }

    #[test]
    fn missing_texture_renders_flat_color() {
        let asset = two_material_asset();
        let mut cache = TextureCache::new();
        let mut loader = FakeLoader::default();
        let bindings = MaterialBindings::resolve(&asset, &mut cache, &mut loader);

        assert_eq!(bindings.per_group[0], Binding::FlatColor([0.8, 0.6, 0.5]));
        assert_eq!(
            bindings.per_group[1],
            Binding::Texture("models/leaf.png".to_string())
        );
        // Same file behind a different spelling: one load.
        assert_eq!(bindings.per_group[2], bindings.per_group[1]);
        assert_eq!(loader.loads.len(), 1);
    }

    #[test]
    fn default_group_is_white() {
        let asset = load_obj_from_str("v 0 0 0\nv 1 0 0\nv 1 1 0\nf 1 2 3\n").expect("parse");
        let mut cache = TextureCache::new();
        let bindings = MaterialBindings::resolve(&asset, &mut cache, &mut FakeLoader::default());
        assert_eq!(bindings.per_group, vec![Binding::FlatColor([1.0, 1.0, 1.0])]);
        assert_eq!(bindings.per_group[0].tint(), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn plan_draws_groups_then_overlay() {
        let asset = two_material_asset();
        let mut cache = TextureCache::new();
        let bindings = MaterialBindings::resolve(&asset, &mut cache, &mut FakeLoader::default());
        let pose = AnimationClip::default().pose(0.3);
        let plan = plan_frame(&pose, &SceneLayout::default(), &bindings, &overlay());

        let targets: Vec<DrawTarget> = plan.draws.iter().map(|d| d.target).collect();
        assert_eq!(
            targets,
            vec![
                DrawTarget::Group(0),
                DrawTarget::Group(1),
                DrawTarget::Group(2),
                DrawTarget::Overlay
            ]
        );
        let tint = plan.draws[0].binding.tint();
        assert!((tint[0] - 0.6038).abs() < 1e-3, "{tint:?}");
        assert_eq!(tint[3], 1.0);
    }

    #[test]
    fn overlay_follows_expression() {
        let bindings: MaterialBindings<String> = MaterialBindings { per_group: vec![] };
        let layout = SceneLayout::default();
        let mut pose = Pose::default();

        let plan = plan_frame(&pose, &layout, &bindings, &overlay());
        assert_eq!(plan.draws[0].binding, Binding::Texture("smile_1".to_string()));

        pose.expression = Expression::Alternate;
        let plan = plan_frame(&pose, &layout, &bindings, &overlay());
        assert_eq!(plan.draws[0].binding, Binding::Texture("smile_2".to_string()));
    }

    #[test]
    fn hide_mode_drops_overlay_while_blinking() {
        let bindings: MaterialBindings<String> = MaterialBindings {
            per_group: vec![Binding::FlatColor([1.0; 3])],
        };
        let layout = SceneLayout {
            overlay_mode: OverlayMode::Hide,
            ..SceneLayout::default()
        };
        let mut pose = Pose::default();

        let plan = plan_frame(&pose, &layout, &bindings, &overlay());
        assert_eq!(plan.draws.len(), 2);
        assert_eq!(plan.draws[1].binding, Binding::Texture("smile_1".to_string()));

        pose.expression = Expression::Alternate;
        let plan = plan_frame(&pose, &layout, &bindings, &overlay());
        assert_eq!(plan.draws.len(), 1);
        assert_eq!(plan.draws[0].target, DrawTarget::Group(0));
    }

    #[test]
    fn flat_color_tint_is_linearized() {
        let tint = |rgb| Binding::<String>::FlatColor(rgb).tint();
        assert_eq!(tint([1.0, 0.0, 1.0]), [1.0, 0.0, 1.0, 1.0]);
        let mid = tint([0.5, 0.8, 0.04]);
        assert!((mid[0] - 0.2140).abs() < 1e-3, "{mid:?}");
        assert!((mid[1] - 0.6038).abs() < 1e-3, "{mid:?}");
        assert!((mid[2] - 0.04 / 12.92).abs() < 1e-6, "{mid:?}");
        assert_eq!(Binding::Texture(()).tint(), [1.0; 4]);
    }

    #[test]
    fn layout_camera_pans_only_when_configured() {
        let still = SceneLayout::default();
        assert_eq!(still.camera(1.5, 0.8), Camera::stage(1.5));

        let panning = SceneLayout {
            camera_pan: Some(CameraPan::centered(60.0)),
            ..SceneLayout::default()
        };
        assert_eq!(panning.camera(1.5, 0.0).eye.x, -30.0);
        assert_eq!(panning.camera(1.5, 0.5).target.x, 0.0);
    }

    #[test]
    fn overlay_keeps_constant_local_offset() {
        let bindings: MaterialBindings<String> = MaterialBindings {
            per_group: vec![Binding::FlatColor([1.0; 3])],
        };
        let layout = SceneLayout::default();
        let clip = AnimationClip::default();

        for t in [0.0f32, 0.2, 0.45, 0.7, 0.95] {
            let plan = plan_frame(&clip.pose(t), &layout, &bindings, &overlay());
            let model = plan.draws[0].model;
            let overlay_model = plan.draws[1].model;
            // Overlay relative to the model never changes.
            let relative = model.inverse() * overlay_model;
            let expected = layout.overlay_local().matrix();
            assert!(
                relative.abs_diff_eq(expected, 1e-4),
                "t = {t}: {relative:?} != {expected:?}"
            );
        }
    }

    #[test]
    fn overlay_faces_the_camera_at_rest() {
        let layout = SceneLayout::default();
        let plan = plan_frame(
            &Pose::default(),
            &layout,
            &MaterialBindings::<String> { per_group: vec![] },
            &overlay(),
        );
        let m = plan.draws[0].model;
        // Face sits in front of the model (towards -Y, where the camera is) and
        // its quad normal points at the camera.
        let center = m.transform_point3(Vec3::ZERO);
        assert!(center.y < -2.9, "{center:?}");
        let normal = m.transform_vector3(Vec3::NEG_Y).normalize();
        assert!(normal.y < -0.99, "{normal:?}");
    }
}
