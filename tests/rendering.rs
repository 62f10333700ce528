extern crate env_logger;
extern crate pigment;

use std::cell::RefCell;
use std::rc::Rc;

use pigment::prelude::*;
use pigment::settings::DeviceParams;

fn device() -> (Device, HeadlessLog) {
    let _ = env_logger::try_init();

    let visitor = HeadlessVisitor::new();
    let log = visitor.log();
    let device = Device::new(Box::new(visitor), Capabilities::all(), DeviceParams::default()).unwrap();
    (device, log)
}

fn actor(effect: Shared<Effect>) -> Shared<Actor> {
    let renderable: Rc<dyn Renderable> = Rc::new(DrawArrays::new(Primitive::Triangles, 0, 3));
    shared(Actor::new(Some(renderable), Some(effect), None))
}

fn rendering(actors: &[Shared<Actor>]) -> Rendering {
    let mut scene = ActorCollection::new();
    for v in actors {
        scene.push(v.clone());
    }

    let mut rendering = Rendering::default();
    rendering.add_scene_manager(shared(scene));
    rendering
}

struct PassRecorder(Rc<RefCell<Vec<usize>>>);

impl ActorEventCallback for PassRecorder {
    fn on_actor_render_started(
        &mut self,
        _: &mut Actor,
        _: f64,
        _: &Camera,
        _: &Rc<dyn Renderable>,
        _: &Shared<Shader>,
        pass: usize,
    ) {
        self.0.borrow_mut().push(pass);
    }
}

#[test]
fn passes_in_order() {
    let (mut device, log) = device();

    let mut effect = Effect::new();
    for _ in 0..2 {
        let mut overlay = Shader::new();
        overlay.goc_depth_mask().borrow_mut().write = false;
        effect.lod_mut(0).push(shared(overlay));
    }

    let passes = Rc::new(RefCell::new(Vec::new()));
    let cube = actor(shared(effect));
    cube.borrow_mut()
        .add_callback(shared(PassRecorder(passes.clone())));

    let mut rendering = rendering(&[cube]);
    rendering.render(&mut device, 0.0).unwrap();

    assert_eq!(*passes.borrow(), vec![0, 1, 2]);
    assert_eq!(log.draws(), 3);
}

fn blended_first_pass(kind: SorterKind) -> Vec<usize> {
    let (mut device, _) = device();

    let mut blended = Shader::new();
    blended.enable(Capability::Blend);
    let opaque = Shader::new();
    let effect = Effect::with_lods(vec![vec![shared(blended), shared(opaque)]]);

    let passes = Rc::new(RefCell::new(Vec::new()));
    let glass = actor(shared(effect));
    glass
        .borrow_mut()
        .add_callback(shared(PassRecorder(passes.clone())));
    let wall = actor(shared(Effect::new()));

    let mut rendering = rendering(&[glass, wall]);
    let mut params = RenderingParams::default();
    params.sorter = kind;
    rendering.set_params(params);
    rendering.render(&mut device, 0.0).unwrap();

    let visited = passes.borrow().clone();
    visited
}

#[test]
fn passes_in_order_when_first_pass_blends() {
    assert_eq!(blended_first_pass(SorterKind::Standard), vec![0, 1]);
    assert_eq!(blended_first_pass(SorterKind::Occlusion), vec![0, 1]);
    assert_eq!(blended_first_pass(SorterKind::Basic), vec![0, 1]);
}

#[test]
fn enable_mask_zero_is_never_drawn() {
    let (mut device, log) = device();

    let visible = actor(shared(Effect::new()));
    let hidden = actor(shared(Effect::new()));
    hidden.borrow_mut().set_enable_mask(0);

    let mut rendering = rendering(&[visible.clone(), hidden.clone()]);
    let queue = rendering.collect_queue();
    assert_eq!(queue.len(), 1);
    assert!(Rc::ptr_eq(&queue[0].actor, &visible));

    rendering.set_enable_mask(0b10);
    visible.borrow_mut().set_enable_mask(0b01);
    assert!(rendering.collect_queue().is_empty());

    rendering.set_enable_mask(0xFFFF_FFFF);
    rendering.render(&mut device, 0.0).unwrap();
    assert_eq!(log.draws(), 1);
}

#[test]
fn renderer_mask_filters_tokens() {
    let (mut device, log) = device();

    let a = actor(shared(Effect::new()));
    let b = actor(shared(Effect::new()));
    b.borrow_mut().set_enable_mask(0b10);

    let mut rendering = rendering(&[a, b]);
    rendering.renderer_mut().set_enable_mask(0b01);
    rendering.render(&mut device, 0.0).unwrap();
    assert_eq!(log.draws(), 1);
}

struct RenderToTexture {
    texture: Rc<Texture>,
    producer: Shared<dyn RenderingAbstract>,
    consumer: Shared<dyn RenderingAbstract>,
}

fn render_to_texture() -> RenderToTexture {
    let texture = Rc::new(Texture::new(TextureParams::new(TextureFormat::RGBA8, 64, 64)));

    let mut fbo = FramebufferObject::new(64, 64);
    fbo.add_texture_attachment(AttachmentPoint::Color(0), texture.clone(), 0, None)
        .unwrap();

    let mut producer = rendering(&[actor(shared(Effect::new()))]);
    producer
        .renderer_mut()
        .set_target(RenderTarget::Framebuffer(shared(fbo)));

    let mut sampling = Shader::new();
    sampling
        .set_render_state_indexed(shared(TextureSampler::new(texture.clone())), 0)
        .unwrap();
    let consumer = rendering(&[actor(shared(Effect::with_lods(vec![vec![shared(sampling)]])))]);

    RenderToTexture {
        texture,
        producer: shared(producer),
        consumer: shared(consumer),
    }
}

#[test]
fn rendering_tree_runs_in_order() {
    let (mut device, log) = device();
    let rtt = render_to_texture();

    let mut tree = RenderingTree::new();
    tree.push(rtt.producer.clone());
    tree.push(rtt.consumer.clone());
    assert!(tree.check_dependencies().is_ok());

    tree.render(&mut device, 0.0).unwrap();
    assert!(log.unwritten_reads().is_empty());
    assert!(log.is_written(rtt.texture.handle().unwrap()));
    assert_eq!(log.draws(), 2);
}

#[test]
fn rendering_tree_misordered() {
    let (mut device, log) = device();
    let rtt = render_to_texture();

    let mut tree = RenderingTree::new();
    tree.push(rtt.consumer.clone());
    tree.push(rtt.producer.clone());

    match tree.check_dependencies() {
        Err(Error::RenderingOrder(0, 1)) => {}
        other => panic!("unexpected {:?}", other),
    }

    // Execution still follows the list.
    tree.render(&mut device, 0.0).unwrap();
    assert_eq!(log.unwritten_reads(), vec![rtt.texture.handle().unwrap()]);
}

#[test]
fn disabled_sub_rendering() {
    let (mut device, log) = device();
    let rtt = render_to_texture();
    rtt.producer.borrow_mut().set_enable_mask(0b10);

    let mut tree = RenderingTree::new();
    tree.set_enable_mask(0b01);
    tree.push(rtt.producer.clone());
    tree.push(rtt.consumer.clone());
    tree.render(&mut device, 0.0).unwrap();

    assert_eq!(log.draws(), 1);
}

#[test]
fn default_overrides() {
    let (mut device, log) = device();

    let mut rendering = rendering(&[actor(shared(Effect::new()))]);
    rendering
        .renderer_mut()
        .set_default_override(StateValue::ColorMask(ColorMask::new(true, false, false, true)));
    rendering.render(&mut device, 0.0).unwrap();

    let masked = log.calls().into_iter().any(|v| match v {
        Call::State {
            kind: RenderStateKind::ColorMask,
            value: Some(StateValue::ColorMask(mask)),
            ..
        } => mask == ColorMask::new(true, false, false, true),
        _ => false,
    });

    assert!(masked);
}

#[test]
fn readback_callbacks() {
    let (mut device, log) = device();

    let mut readback = ReadPixels::new(
        RenderTarget::default(),
        Rect::with_size(4, 2),
        TextureFormat::RGBA8,
    );
    readback.one_shot = true;
    let pixels = readback.pixels();

    let mut rendering = rendering(&[actor(shared(Effect::new()))]);
    rendering.renderer_mut().add_callback(shared(readback));

    rendering.render(&mut device, 0.0).unwrap();
    assert_eq!(pixels.borrow().len(), 4 * 2 * 4);
    assert!(rendering.renderer().callbacks().is_empty());

    let reads = log
        .calls()
        .into_iter()
        .filter(|v| match *v {
            Call::ReadPixels { .. } => true,
            _ => false,
        })
        .count();
    assert_eq!(reads, 1);
}

struct Pulse;

impl ShaderAnimator for Pulse {
    fn update_shader(&mut self, shader: &mut Shader, _: &Camera, frame_clock: f64) {
        shader.set_uniform("u_Time", frame_clock as f32);
    }
}

#[test]
fn shader_animation() {
    let (mut device, _) = device();

    let effect = Effect::new();
    effect
        .main_shader()
        .borrow_mut()
        .set_animator(Some(Box::new(Pulse)));
    let shader = effect.main_shader().clone();

    let mut rendering = rendering(&[actor(shared(effect))]);
    rendering.render(&mut device, 2.5).unwrap();
    assert_eq!(shader.borrow().uniform("u_Time"), Some(&Uniform::F32(2.5)));
}

#[test]
fn missing_framebuffer_support() {
    let visitor = HeadlessVisitor::new();
    let mut device = Device::new(
        Box::new(visitor),
        Capabilities::new(Version::GL(2, 0)),
        DeviceParams::default(),
    )
    .unwrap();

    let rtt = render_to_texture();
    match rtt.producer.borrow_mut().render(&mut device, 0.0) {
        Err(Error::Requirement(_)) => {}
        other => panic!("unexpected {:?}", other),
    };
}
