extern crate pigment;

use std::rc::Rc;

use pigment::io::{shader_from_json, shader_to_json};
use pigment::prelude::*;

#[test]
fn material_round_trip() {
    let shader = shared(Shader::new());
    shader
        .borrow_mut()
        .goc_material()
        .borrow_mut()
        .set_diffuse(Color::red());
    shader.borrow_mut().enable(Capability::Lighting);
    shader.borrow_mut().set_uniform("u_Scale", 2.0f32);

    let json = shader_to_json(&shader).unwrap();
    let restored = shader_from_json(&json).unwrap();
    let restored = restored.borrow();

    assert_eq!(
        restored.material().unwrap().borrow().front_diffuse(),
        Color::red()
    );
    assert!(restored.is_enabled(Capability::Lighting));
    assert_eq!(restored.uniform("u_Scale"), Some(&Uniform::F32(2.0)));
}

#[test]
fn effect_round_trip() {
    let light = shared(Light::default());

    let mut base = Shader::new();
    base.set_render_state_indexed(light.clone(), 0).unwrap();
    base.goc_depth_func().borrow_mut().func = Comparison::LessOrEqual;

    let mut overlay = Shader::new();
    overlay.set_render_state_indexed(light, 0).unwrap();
    overlay.goc_depth_mask().borrow_mut().write = false;

    let mut effect = Effect::with_lods(vec![vec![shared(base), shared(overlay)]]);
    effect.set_render_rank(3);
    effect.set_enable_mask(0b101);
    let effect = shared(effect);

    let mut archive = Archive::new();
    archive.export_effect(&effect);
    assert_eq!(archive.shader_count(), 2);

    let bytes = archive.to_bytes().unwrap();
    let imported = Archive::from_bytes(&bytes).unwrap().import().unwrap();
    assert_eq!(imported.effects.len(), 1);

    let effect = imported.effects[0].borrow();
    assert_eq!(effect.lod(0).len(), 2);
    assert_eq!(effect.render_rank(), 3);
    assert_eq!(effect.enable_mask(), 0b101);

    let base = effect.shader(0, 0).borrow();
    let overlay = effect.shader(0, 1).borrow();
    assert_eq!(
        base.depth_func().unwrap().borrow().func,
        Comparison::LessOrEqual
    );
    assert!(!overlay.depth_mask().unwrap().borrow().write);
    assert!(Rc::ptr_eq(
        &base.light(0).unwrap(),
        &overlay.light(0).unwrap()
    ));
}

#[test]
fn json_and_bytes_agree() {
    let mut shader = Shader::new();
    shader.goc_blend_func();
    shader.enable(Capability::Blend);
    let shader = shared(shader);

    let mut archive = Archive::new();
    archive.export_shader(&shader);

    let from_json = Archive::from_json(&archive.to_json().unwrap()).unwrap();
    let from_bytes = Archive::from_bytes(&archive.to_bytes().unwrap()).unwrap();
    assert_eq!(from_json.state_count(), from_bytes.state_count());

    for archive in &[from_json, from_bytes] {
        let imported = archive.import().unwrap();
        assert!(imported.shaders[0].borrow().is_translucent());
    }
}

#[test]
fn garbage_is_rejected() {
    assert!(Archive::from_json("{ \"states\": 7 }").is_err());
    assert!(Archive::from_bytes(&[0xFF, 0xFF, 0xFF]).is_err());
    assert!(shader_from_json(&Archive::new().to_json().unwrap()).is_err());
}
