//! Frame composition.
//!
//! Every frame runs the same fixed chain of passes:
//!
//! 1. Scene pass into an offscreen target: the gradient backdrop (if one is
//!    bound), then the model meshes with lighting and fog
//! 2. Bloom on the scene target
//! 3. Depth of field on the bloom output, written to the surface
//!
//! While no model is loaded the scene pass only draws the backdrop.

use std::iter;

use crate::{
    context::Context,
    data_structures::{
        model::{DrawModel, Model},
        texture::Texture,
    },
    pipelines::{
        background::BackgroundPipeline,
        bloom::BloomPass,
        depth_of_field::DepthOfFieldPass,
        scene::{mk_material_layout, mk_scene_pipeline},
    },
    scene::SceneComposition,
};

pub struct Renderer {
    background: BackgroundPipeline,
    background_group: Option<wgpu::BindGroup>,
    // revision of the scene config the backdrop was last uploaded for
    background_revision: Option<u64>,
    scene_pipeline: wgpu::RenderPipeline,
    material_layout: wgpu::BindGroupLayout,
    scene_target: Texture,
    bloom: BloomPass,
    depth_of_field: DepthOfFieldPass,
}

impl Renderer {
    pub fn new(ctx: &Context, composition: &SceneComposition) -> Self {
        let device = &ctx.device;
        let viewport = ctx.viewport();
        let material_layout = mk_material_layout(device);
        let scene_pipeline = mk_scene_pipeline(
            device,
            &ctx.camera.bind_group_layout,
            &ctx.light.bind_group_layout,
            &material_layout,
        );
        let scene_target = Texture::create_render_target(device, viewport, "scene_target");
        let bloom = BloomPass::new(
            device,
            &composition.post_processing.bloom,
            &scene_target,
            viewport,
        );
        let depth_of_field = DepthOfFieldPass::new(
            device,
            &composition.post_processing.depth_of_field,
            ctx.config.format,
            bloom.output(),
            &ctx.depth_texture,
            &ctx.projection,
            viewport,
        );

        Self {
            background: BackgroundPipeline::new(device),
            background_group: None,
            background_revision: None,
            scene_pipeline,
            material_layout,
            scene_target,
            bloom,
            depth_of_field,
        }
    }

    /// Layout of the per-mesh material bind group, needed to upload a [`Model`].
    pub fn material_layout(&self) -> &wgpu::BindGroupLayout {
        &self.material_layout
    }

    /// Recreate the size dependent targets. Call after [`Context::resize`].
    pub fn resize(&mut self, ctx: &Context) {
        let viewport = ctx.viewport();
        self.scene_target = Texture::create_render_target(&ctx.device, viewport, "scene_target");
        self.bloom
            .resize(&ctx.device, &ctx.queue, &self.scene_target, viewport);
        self.depth_of_field.resize(
            &ctx.device,
            &ctx.queue,
            self.bloom.output(),
            &ctx.depth_texture,
            &ctx.projection,
            viewport,
        );
    }

    fn sync_background(&mut self, ctx: &Context) {
        let revision = ctx.scene.revision();
        if self.background_revision == Some(revision) {
            return;
        }
        self.background_revision = Some(revision);
        self.background_group = ctx.scene.background().and_then(|image| {
            let texture = Texture::from_image(
                &ctx.device,
                &ctx.queue,
                image,
                Some("background_texture"),
            );
            self.background.bind(&ctx.device, &texture)
        });
        log::debug!("Uploaded background for scene revision {}", revision);
    }

    pub fn render(&mut self, ctx: &Context, model: Option<&Model>) -> Result<(), wgpu::SurfaceError> {
        self.sync_background(ctx);

        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder: wgpu::CommandEncoder =
            ctx.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });
        {
            let mut render_pass: wgpu::RenderPass<'_> =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Scene Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &self.scene_target.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

            if let Some(background) = &self.background_group {
                render_pass.set_pipeline(&self.background.pipeline);
                render_pass.set_bind_group(0, background, &[]);
                render_pass.draw(0..3, 0..1);
            }

            if let Some(model) = model {
                render_pass.set_pipeline(&self.scene_pipeline);
                render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
                render_pass.set_bind_group(1, &ctx.light.bind_group, &[]);
                render_pass.draw_model(model);
            }
        }

        self.bloom.encode(&mut encoder);
        self.depth_of_field.encode(&mut encoder, &view);

        ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
