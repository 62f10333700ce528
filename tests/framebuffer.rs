extern crate env_logger;
extern crate pigment;

use std::rc::Rc;

use pigment::framebuffer::AttachmentTarget;
use pigment::prelude::*;
use pigment::settings::DeviceParams;

fn device() -> (Device, HeadlessLog) {
    let _ = env_logger::try_init();

    let visitor = HeadlessVisitor::new();
    let log = visitor.log();
    let device = Device::new(Box::new(visitor), Capabilities::all(), DeviceParams::default()).unwrap();
    (device, log)
}

fn color(width: u32, height: u32) -> Rc<Renderbuffer> {
    Rc::new(Renderbuffer::new(RenderbufferParams::new(
        TextureFormat::RGBA8,
        width,
        height,
    )))
}

fn attached(log: &HeadlessLog, point: AttachmentPoint) -> Vec<Option<AttachmentTarget>> {
    log.calls()
        .into_iter()
        .filter_map(|v| match v {
            Call::Attach {
                point: p, target, ..
            } if p == point => Some(target),
            _ => None,
        })
        .collect()
}

#[test]
fn replace_attachment() {
    let (mut device, log) = device();

    let x = color(32, 32);
    let y = color(32, 32);

    let fbo = shared(FramebufferObject::new(32, 32));
    assert!(fbo.borrow_mut().add_color_attachment(0, x.clone()).unwrap().is_none());
    device.bind_target(&RenderTarget::from(fbo.clone())).unwrap();

    let replaced = fbo.borrow_mut().add_color_attachment(0, y.clone()).unwrap();
    assert!(Rc::ptr_eq(replaced.unwrap().renderbuffer().unwrap(), &x));
    assert!(Rc::ptr_eq(
        fbo.borrow().attachment(AttachmentPoint::Color(0)).unwrap().renderbuffer().unwrap(),
        &y
    ));

    device.bind_target(&RenderTarget::from(fbo.clone())).unwrap();

    let targets = attached(&log, AttachmentPoint::Color(0));
    assert_eq!(targets.len(), 2);
    assert_eq!(
        targets[1],
        Some(AttachmentTarget::Renderbuffer(y.handle().unwrap()))
    );
    assert_eq!(fbo.borrow().attachments().count(), 1);
}

#[test]
fn invalid_attachments() {
    let mut fbo = FramebufferObject::new(16, 16);

    let depth = Rc::new(Renderbuffer::new(RenderbufferParams::new(
        TextureFormat::Depth24,
        16,
        16,
    )));

    match fbo.add_color_attachment(0, depth.clone()) {
        Err(Error::InvalidAttachment(AttachmentPoint::Color(0), _)) => {}
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }

    match fbo.add_color_attachment(8, color(16, 16)) {
        Err(Error::TooManyColorAttachments) => {}
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }

    fbo.add_depth_attachment(depth).unwrap();
    assert!(fbo.attachment(AttachmentPoint::Depth).is_some());

    let packed = Rc::new(Renderbuffer::new(RenderbufferParams::new(
        TextureFormat::Depth24Stencil8,
        16,
        16,
    )));
    fbo.add_depth_attachment(packed).unwrap();
    assert!(fbo.attachment(AttachmentPoint::DepthStencil).is_some());
}

#[test]
fn draw_buffers() {
    let (mut device, log) = device();

    let fbo = shared(FramebufferObject::new(8, 8));
    fbo.borrow_mut().add_color_attachment(0, color(8, 8)).unwrap();
    fbo.borrow_mut().add_color_attachment(2, color(8, 8)).unwrap();
    fbo.borrow_mut()
        .set_draw_buffers(&[DrawBuffer::ColorAttachment(2), DrawBuffer::ColorAttachment(0)])
        .unwrap();

    device.bind_target(&RenderTarget::from(fbo.clone())).unwrap();
    let handle = fbo.borrow().handle();
    assert!(log.calls().contains(&Call::DrawBuffers {
        framebuffer: handle,
        buffers: vec![DrawBuffer::ColorAttachment(2), DrawBuffer::ColorAttachment(0)],
    }));

    // A draw buffer without an attachment leaves the framebuffer incomplete.
    fbo.borrow_mut().remove_attachment(AttachmentPoint::Color(2));
    match device.bind_target(&RenderTarget::from(fbo.clone())) {
        Err(Error::FramebufferIncomplete(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn resize() {
    let (mut device, log) = device();

    let texture = Rc::new(Texture::new(TextureParams::new(TextureFormat::RGBA8, 16, 16)));
    let fbo = shared(FramebufferObject::new(16, 16));
    fbo.borrow_mut()
        .add_texture_attachment(AttachmentPoint::Color(0), texture.clone(), 0, None)
        .unwrap();

    device.bind_target(&RenderTarget::from(fbo.clone())).unwrap();
    let before = texture.handle().unwrap();

    fbo.borrow_mut().set_size(32, 32);
    assert_eq!(texture.dimensions(), (32, 32));
    assert_eq!(fbo.borrow().rect(), Rect::with_size(32, 32));

    device.bind_target(&RenderTarget::from(fbo.clone())).unwrap();
    let after = texture.handle().unwrap();
    assert_ne!(before, after);

    let targets = attached(&log, AttachmentPoint::Color(0));
    assert_eq!(
        targets.last(),
        Some(&Some(AttachmentTarget::Texture {
            handle: after,
            level: 0,
            layer: None,
        }))
    );
}

#[test]
fn dropped_framebuffers_are_released() {
    let (mut device, log) = device();

    {
        let fbo = shared(FramebufferObject::new(4, 4));
        fbo.borrow_mut().add_color_attachment(0, color(4, 4)).unwrap();
        device.bind_target(&RenderTarget::from(fbo)).unwrap();
        device.bind_target(&RenderTarget::default()).unwrap();
    }

    device.begin_frame().unwrap();

    let calls = log.calls();
    assert!(calls.iter().any(|v| match *v {
        Call::DeleteFramebuffer(_) => true,
        _ => false,
    }));
    assert!(calls.iter().any(|v| match *v {
        Call::DeleteRenderbuffer(_) => true,
        _ => false,
    }));
}
