//! Pick-driven orchestration of the annotation engine.
//!
//! [`AnnotationEngine`] owns the loaded mesh topology, the active tool and
//! color, the path in progress and the [`AnnotationStore`]. The host forwards
//! resolved surface picks to [`AnnotationEngine::handle_pick`] and reads the
//! renderer outputs back.

mod config;
mod pick;

pub use config::EngineConfig;
pub use pick::{PathDraft, PickEvent, PickOutcome, Tool};

use tracing::{debug, info, warn};

use crate::annotation::{
    ActionKind, AnnotationStore, AnnotationType, ChangeTarget, ClassId, Color, ExportReport,
    Keypoint, ModelState,
};
use crate::error::{GeometryError, Result};
use crate::math::Point3;
use crate::mesh::ModelId;
use crate::operations::region::{FillRegion, IsClosed};
use crate::operations::search::TracePath;
use crate::topology::MeshTopology;

/// Stateful front end of the annotation engine.
///
/// Picks run to completion one at a time. Store state outlives mesh loads:
/// reloading a mesh with the same [`ModelId`] picks up its annotations again.
#[derive(Debug)]
pub struct AnnotationEngine {
    config: EngineConfig,
    store: AnnotationStore,
    topology: Option<MeshTopology>,
    tool: Tool,
    color: Color,
    draft: Option<PathDraft>,
}

impl Default for AnnotationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl AnnotationEngine {
    /// Creates an engine with an empty store.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            store: AnnotationStore::new(),
            topology: None,
            tool: Tool::default(),
            color: Color::RED,
            draft: None,
        }
    }

    /// Replaces the store, e.g. with one restored from disk.
    #[must_use]
    pub fn with_store(mut self, store: AnnotationStore) -> Self {
        self.store = store;
        self
    }

    /// Loads a mesh whose model id derives from the file's byte size.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError` if the buffers are malformed. The previously
    /// loaded mesh and all store state are left untouched.
    pub fn load_mesh(
        &mut self,
        byte_len: usize,
        positions: &[f32],
        indices: Option<&[u32]>,
    ) -> Result<ModelId> {
        let model = ModelId::from_byte_len(byte_len);
        self.load_mesh_with_id(model.clone(), positions, indices)?;
        Ok(model)
    }

    /// Loads a mesh under an explicit model id.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError` if the buffers are malformed. The previously
    /// loaded mesh and all store state are left untouched.
    pub fn load_mesh_with_id(
        &mut self,
        model: ModelId,
        positions: &[f32],
        indices: Option<&[u32]>,
    ) -> Result<()> {
        let topology = MeshTopology::from_buffers(model, positions, indices)
            .inspect_err(|err| warn!(%err, "mesh load rejected"))?;
        info!(
            model = %topology.model,
            vertices = topology.graph.vertex_count(),
            edges = topology.graph.edge_count(),
            triangles = topology.mesh.triangle_count(),
            "mesh loaded"
        );
        self.store.model_mut(&topology.model);
        self.topology = Some(topology);
        self.draft = None;
        Ok(())
    }

    /// Rebuilds graph and edge index for new geometry of the current model.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NoMeshLoaded` without a mesh, or any error of
    /// [`AnnotationEngine::load_mesh_with_id`].
    pub fn update_geometry(&mut self, positions: &[f32], indices: Option<&[u32]>) -> Result<()> {
        let model = self.current_model()?.clone();
        self.load_mesh_with_id(model, positions, indices)
    }

    /// Switches tool. A path in progress is discarded when the tool changes.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool != self.tool {
            debug!(from = ?self.tool, to = ?tool, "tool changed");
            self.draft = None;
        }
        self.tool = tool;
    }

    /// Sets the color used by subsequent paint, keypoint and fill picks.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Discards the path in progress.
    pub fn cancel_path(&mut self) {
        self.draft = None;
    }

    /// Applies a surface pick with the active tool.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NoMeshLoaded` without a mesh, or a store error
    /// if the pick would violate a store invariant.
    pub fn handle_pick(&mut self, event: PickEvent) -> Result<PickOutcome> {
        let topology = self.topology.as_ref().ok_or(GeometryError::NoMeshLoaded)?;
        let vertex = event
            .vertex
            .filter(|&v| topology.graph.contains(v))
            .or_else(|| topology.graph.nearest_vertex(&event.point));
        let Some(vertex) = vertex else {
            debug!("pick on empty mesh ignored");
            return Ok(PickOutcome::Ignored);
        };

        match self.tool {
            Tool::Spray => self.spray(vertex, &event.point),
            Tool::Keypoint => self.place_keypoint(event.point),
            Tool::Path => self.extend_path(vertex),
            Tool::Pan | Tool::None => Ok(PickOutcome::Ignored),
        }
    }

    fn spray(&mut self, vertex: u32, point: &Point3) -> Result<PickOutcome> {
        let topology = self.topology.as_ref().ok_or(GeometryError::NoMeshLoaded)?;
        let vertices = if self.config.spray_radius > 0.0 {
            topology
                .graph
                .vertices_within(vertex, point, self.config.spray_radius)
        } else {
            vec![vertex]
        };
        let color = self.color;
        self.store.commit_action(
            &topology.model,
            ActionKind::Spray,
            vertices.iter().map(|&v| (ChangeTarget::Vertex(v), color)),
        )?;
        debug!(vertices = vertices.len(), %color, "sprayed");
        Ok(PickOutcome::Painted { vertices })
    }

    fn place_keypoint(&mut self, position: Point3) -> Result<PickOutcome> {
        let topology = self.topology.as_ref().ok_or(GeometryError::NoMeshLoaded)?;
        self.store.commit_action(
            &topology.model,
            ActionKind::Point,
            [(ChangeTarget::Keypoint(position), self.color)],
        )?;
        debug!(?position, "keypoint placed");
        Ok(PickOutcome::KeypointAdded { position })
    }

    fn extend_path(&mut self, vertex: u32) -> Result<PickOutcome> {
        let topology = self.topology.as_ref().ok_or(GeometryError::NoMeshLoaded)?;
        let Some(draft) = self.draft.as_mut() else {
            debug!(vertex, "path started");
            self.draft = Some(PathDraft::new(vertex));
            return Ok(PickOutcome::PathStarted { vertex });
        };

        let from = draft.last_vertex();
        if from == vertex {
            return Ok(PickOutcome::Ignored);
        }
        let segment = TracePath::new(from, vertex)
            .with_params(self.config.search)
            .execute(&topology.graph)?;
        debug!(from, to = vertex, method = ?segment.method, hops = segment.hop_count(), "segment traced");
        draft.segments.push(segment.clone());

        if !IsClosed::new()
            .with_tolerance(self.config.closure_tolerance)
            .execute(&draft.segments)
        {
            return Ok(PickOutcome::SegmentAdded { segment });
        }

        let fill = FillRegion::new(&draft.segments)
            .with_params(self.config.fill)
            .execute(&topology.mesh, &topology.edges);
        let ring = draft.ring();
        let color = self.color;
        match &fill {
            Some(region) => {
                self.store.commit_action(
                    &topology.model,
                    ActionKind::Spray,
                    region.vertices.iter().map(|&v| (ChangeTarget::Vertex(v), color)),
                )?;
                info!(
                    triangles = region.triangles.len(),
                    vertices = region.vertices.len(),
                    "loop filled"
                );
            }
            None => warn!(segments = draft.segments.len(), "closed loop encloses no triangles"),
        }
        self.store.record_loop(&topology.model, ring, color);
        self.draft = None;
        Ok(PickOutcome::LoopClosed { segment, fill })
    }

    /// Undoes the latest action of the current model.
    pub fn undo(&mut self) -> bool {
        match self.topology.as_ref() {
            Some(topology) => self.store.undo(&topology.model),
            None => false,
        }
    }

    /// Redoes the next undone action of the current model.
    pub fn redo(&mut self) -> bool {
        match self.topology.as_ref() {
            Some(topology) => self.store.redo(&topology.model),
            None => false,
        }
    }

    /// Flat RGB buffer with one color per vertex, `unlabelled` where no class
    /// color is set.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NoMeshLoaded` without a mesh.
    pub fn color_buffer(&self, unlabelled: Color) -> Result<Vec<f32>> {
        let topology = self.topology.as_ref().ok_or(GeometryError::NoMeshLoaded)?;
        let colors = self.store.model(&topology.model).map(ModelState::colors);
        let count = topology.graph.vertex_count();
        let mut buffer = Vec::with_capacity(count * 3);
        for v in 0..count {
            let color = u32::try_from(v)
                .ok()
                .and_then(|v| colors.and_then(|c| c.get(&v)))
                .copied()
                .unwrap_or(unlabelled);
            buffer.extend(color.to_f32());
        }
        Ok(buffer)
    }

    /// Keypoints of the current model in placement order.
    #[must_use]
    pub fn keypoints(&self) -> &[Keypoint] {
        self.topology
            .as_ref()
            .and_then(|t| self.store.model(&t.model))
            .map(ModelState::keypoints)
            .unwrap_or_default()
    }

    /// Builds the annotation export of the current model.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NoMeshLoaded` without a mesh.
    pub fn export(&self, filename: &str) -> Result<ExportReport> {
        let topology = self.topology.as_ref().ok_or(GeometryError::NoMeshLoaded)?;
        let report = self
            .store
            .export(&topology.model, filename, topology.graph.vertex_count());
        if report.unlabelled_vertices > 0 {
            warn!(
                unlabelled = report.unlabelled_vertices,
                "exporting with unlabelled vertices"
            );
        }
        Ok(report)
    }

    /// Starts annotating a class of the current model and switches to its
    /// tool and color.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NoMeshLoaded` without a mesh, or the store's
    /// rejection (e.g. another class is annotating).
    pub fn begin_class_annotation(&mut self, class: ClassId) -> Result<()> {
        let model = self.current_model()?.clone();
        self.store.begin_class_annotation(&model, class)?;
        let Some((annotation_type, color)) = self
            .store
            .model(&model)
            .and_then(|s| s.class(class))
            .map(|c| (c.annotation_type(), c.color))
        else {
            return Ok(());
        };
        let tool = match annotation_type {
            AnnotationType::Keypoint => Tool::Keypoint,
            AnnotationType::Spray => Tool::Spray,
            AnnotationType::Path => Tool::Path,
            AnnotationType::None => Tool::None,
        };
        self.color = color;
        self.set_tool(tool);
        Ok(())
    }

    /// Finishes annotating a class of the current model.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NoMeshLoaded` without a mesh, or the store's
    /// rejection.
    pub fn finish_class_annotation(&mut self, class: ClassId) -> Result<()> {
        let model = self.current_model()?.clone();
        self.store.finish_class_annotation(&model, class)?;
        self.set_tool(Tool::None);
        Ok(())
    }

    fn current_model(&self) -> Result<&ModelId> {
        self.topology
            .as_ref()
            .map(|t| &t.model)
            .ok_or_else(|| GeometryError::NoMeshLoaded.into())
    }

    /// Id of the loaded model.
    #[must_use]
    pub fn model(&self) -> Option<&ModelId> {
        self.topology.as_ref().map(|t| &t.model)
    }

    /// Graph, edge index and mesh of the loaded model.
    #[must_use]
    pub fn topology(&self) -> Option<&MeshTopology> {
        self.topology.as_ref()
    }

    /// Annotation state of every model seen so far.
    #[must_use]
    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// Mutable store access, e.g. to manage problems and classes.
    pub fn store_mut(&mut self) -> &mut AnnotationStore {
        &mut self.store
    }

    /// Active tunables.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Active tool.
    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Active paint color.
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Path in progress, if any.
    #[must_use]
    pub fn path_draft(&self) -> Option<&PathDraft> {
        self.draft.as_ref()
    }
}
