//! Object configuration: the process models bound to one simulated object and its status.
//!
//! A [`ModelList`] is built once per object with a [`ModelListBuilder`]. The bound models
//! never change afterwards (clone the list to get a variant), while the status table
//! evolves in place as processes are simulated.
//!
//! The models declare which variables they read and write, and which processes they call
//! themselves. From this the list derives the variables the user has to initialise, the
//! dependency graph between processes and the order in which the root processes run.

use crate::components::{
    EnergyBalanceModel, LightInterceptionModel, PhotosynthesisModel, StomatalConductanceModel,
};
use log::warn;
use petgraph::algo::toposort;
use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use petgraph::visit::{
    depth_first_search, DfsEvent, IntoNeighbors, IntoNodeIdentifiers, Visitable,
};
use petgraph::Graph;
use plantbiophys_core::component::{self, Process, ProcessModel};
use plantbiophys_core::errors::{BiophysError, BiophysResult};
use plantbiophys_core::status::{init_status, is_initialized};
use plantbiophys_core::timestep_table::{homogeneous_time_steps, StatusValue, TimeStepTable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Graph of the processes of an object, with one edge per variable flowing between them
pub type ProcessGraph = Graph<Process, String>;

/// The model bound to each process of an object
///
/// An empty slot means the process is not simulated for this object. This is the shape
/// configuration files are read into:
///
/// ```rust
/// use plantbiophys_components::model_list::ProcessModels;
/// use plantbiophys_core::component::Process;
///
/// let models: ProcessModels = serde_json::from_str(
///     r#"{
///         "energy_balance": {"model": "Monteith"},
///         "photosynthesis": {"model": "Fvcb", "vcmax_ref": 150.0},
///         "stomatal_conductance": {"model": "Medlyn", "g0": 0.03, "g1": 12.0}
///     }"#,
/// )
/// .unwrap();
///
/// assert!(models.light_interception.is_none());
/// assert_eq!(models.roots(), vec![Process::EnergyBalance]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessModels {
    pub light_interception: Option<LightInterceptionModel>,
    pub energy_balance: Option<EnergyBalanceModel>,
    pub photosynthesis: Option<PhotosynthesisModel>,
    pub stomatal_conductance: Option<StomatalConductanceModel>,
}

impl ProcessModels {
    /// Model bound to a process, if any
    pub fn get(&self, process: Process) -> Option<&dyn ProcessModel> {
        match process {
            Process::LightInterception => self
                .light_interception
                .as_ref()
                .map(|m| m as &dyn ProcessModel),
            Process::EnergyBalance => self.energy_balance.as_ref().map(|m| m as &dyn ProcessModel),
            Process::Photosynthesis => self.photosynthesis.as_ref().map(|m| m as &dyn ProcessModel),
            Process::StomatalConductance => self
                .stomatal_conductance
                .as_ref()
                .map(|m| m as &dyn ProcessModel),
        }
    }

    /// Processes that have a model bound
    pub fn processes(&self) -> Vec<Process> {
        Process::ALL
            .into_iter()
            .filter(|p| self.get(*p).is_some())
            .collect()
    }

    /// All the bound models
    pub fn bound(&self) -> Vec<&dyn ProcessModel> {
        Process::ALL.into_iter().filter_map(|p| self.get(p)).collect()
    }

    /// The model bound to `process` and every model it calls, directly or not
    ///
    /// Empty if no model is bound to `process`. Nested processes without a model are
    /// skipped; the calling model reports them when it runs.
    pub fn subtree(&self, process: Process) -> Vec<&dyn ProcessModel> {
        let mut visited = BTreeSet::new();
        let mut pending = vec![process];
        let mut models = vec![];

        while let Some(p) = pending.pop() {
            if !visited.insert(p) {
                continue;
            }
            if let Some(model) = self.get(p) {
                pending.extend(model.nested_processes());
                models.push(model);
            }
        }
        models
    }

    /// Bound processes that no other bound model calls
    ///
    /// These are the processes run when the whole object is simulated.
    pub fn roots(&self) -> Vec<Process> {
        let nested: BTreeSet<Process> = self
            .bound()
            .iter()
            .flat_map(|m| {
                let process = m.process();
                m.nested_processes()
                    .into_iter()
                    .filter(move |p| *p != process)
            })
            .collect();

        self.processes()
            .into_iter()
            .filter(|p| !nested.contains(p))
            .collect()
    }

    /// Dependency graph between the bound processes, from their own declarations
    pub fn dependency_graph(&self) -> ProcessGraph {
        let nodes = self
            .processes()
            .into_iter()
            .filter_map(|p| {
                self.get(p)
                    .map(|m| (p, to_set(m.input_names()), to_set(m.output_names())))
            })
            .collect();
        build_graph(nodes)
    }

    /// Dependency graph between the root processes
    ///
    /// Each root stands for its whole subtree: it reads what the subtree needs from
    /// outside and writes everything the subtree writes.
    pub fn root_graph(&self) -> ProcessGraph {
        let nodes = self
            .roots()
            .into_iter()
            .map(|p| {
                let subtree = self.subtree(p);
                let outputs = component::outputs(&subtree);
                let inputs = component::to_initialize(&subtree);
                (p, inputs, outputs)
            })
            .collect();
        build_graph(nodes)
    }

    /// Order in which the root processes must run
    ///
    /// Producers run before consumers. Two root processes that need each other's outputs
    /// cannot be ordered: one of them should call the other instead.
    pub fn execution_order(&self) -> BiophysResult<Vec<Process>> {
        let graph = self.root_graph();

        if let Some((a, b)) = find_back_edge(&graph) {
            let variable = graph
                .find_edge(a, b)
                .map(|e| graph[e].clone())
                .unwrap_or_default();
            return Err(BiophysError::CyclicDependency {
                from: graph[a],
                to: graph[b],
                variable,
            });
        }

        let order = toposort(&graph, None).map_err(|cycle| {
            BiophysError::Error(format!(
                "Cannot order the processes, {} is part of a cycle",
                graph[cycle.node_id()]
            ))
        })?;
        Ok(order.into_iter().map(|node| graph[node]).collect())
    }
}

fn to_set(names: Vec<String>) -> BTreeSet<String> {
    names.into_iter().collect()
}

/// One node per process, one edge per variable written by a process and read by another
fn build_graph(nodes: Vec<(Process, BTreeSet<String>, BTreeSet<String>)>) -> ProcessGraph {
    let mut graph = ProcessGraph::new();
    let indices: Vec<NodeIndex> = nodes.iter().map(|(p, _, _)| graph.add_node(*p)).collect();

    for (producer, (_, _, outputs)) in indices.iter().zip(&nodes) {
        for (consumer, (_, inputs, _)) in indices.iter().zip(&nodes) {
            if producer == consumer {
                continue;
            }
            for variable in outputs.intersection(inputs) {
                graph.add_edge(*producer, *consumer, variable.clone());
            }
        }
    }
    graph
}

/// First edge closing a cycle between two distinct nodes, if any
fn find_back_edge<G>(g: G) -> Option<(G::NodeId, G::NodeId)>
where
    G: IntoNodeIdentifiers + IntoNeighbors + Visitable,
{
    depth_first_search(g, g.node_identifiers(), |event| match event {
        // Self-referential cycles are fine
        DfsEvent::BackEdge(a, b) if a != b => Err((a, b)),
        _ => Ok(()),
    })
    .err()
}

/// What to do when a simulation starts with variables still uninitialised
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitPolicy {
    /// Log a warning and simulate anyway
    #[default]
    Warn,
    /// Refuse to simulate
    Strict,
}

/// The process models of one simulated object, with its status at each time step
#[derive(Debug, Clone, PartialEq)]
pub struct ModelList {
    models: ProcessModels,
    status: TimeStepTable,
    policy: InitPolicy,
}

impl ModelList {
    pub fn builder() -> ModelListBuilder {
        ModelListBuilder::new()
    }

    /// Bind `models` to a fresh object, with every variable uninitialised
    pub fn new(models: ProcessModels) -> BiophysResult<Self> {
        ModelListBuilder::new().with_models(models).build()
    }

    pub fn models(&self) -> &ProcessModels {
        &self.models
    }

    pub fn status(&self) -> &TimeStepTable {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut TimeStepTable {
        &mut self.status
    }

    pub fn into_status(self) -> TimeStepTable {
        self.status
    }

    /// Models and status borrowed together, to run the former on the latter
    pub(crate) fn split_mut(&mut self) -> (&ProcessModels, &mut TimeStepTable) {
        (&self.models, &mut self.status)
    }

    pub fn policy(&self) -> InitPolicy {
        self.policy
    }

    /// Variables read by the bound models
    pub fn inputs(&self) -> BTreeSet<String> {
        component::inputs(&self.models.bound())
    }

    /// Variables written by the bound models
    pub fn outputs(&self) -> BTreeSet<String> {
        component::outputs(&self.models.bound())
    }

    /// Variables that no bound model computes and that must be given by the user
    pub fn to_initialize(&self) -> BTreeSet<String> {
        component::to_initialize(&self.models.bound())
    }

    /// True if all the variables to initialise are set at every time step
    pub fn is_initialized(&self) -> bool {
        let to_init = self.to_initialize();
        self.status
            .iter()
            .all(|status| is_initialized(status, &to_init))
    }

    /// Apply the initialisation policy to `to_init`
    ///
    /// # Errors
    ///
    /// [`BiophysError::UninitializedVariables`] with the [`InitPolicy::Strict`] policy if
    /// any time step still holds the sentinel for one of `to_init`.
    pub fn check_initialized(&self, to_init: &BTreeSet<String>) -> BiophysResult<()> {
        let missing: BTreeSet<String> = self
            .status
            .iter()
            .flat_map(|status| status.uninitialized(to_init))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        let missing: Vec<String> = missing.into_iter().collect();
        match self.policy {
            InitPolicy::Warn => {
                warn!(
                    "Some variables must be initialised before simulation: {}. \
                     The outputs will not be meaningful",
                    missing.join(", ")
                );
                Ok(())
            }
            InitPolicy::Strict => Err(BiophysError::UninitializedVariables(missing)),
        }
    }

    /// Dependency graph between all the bound processes
    pub fn dependency_graph(&self) -> ProcessGraph {
        self.models.dependency_graph()
    }

    /// Order in which the root processes run for a full simulation
    pub fn execution_order(&self) -> BiophysResult<Vec<Process>> {
        self.models.execution_order()
    }

    /// Graphviz rendering of the dependency graph
    ///
    /// Useful for debugging.
    pub fn as_dot(&self) -> String {
        let graph = self.dependency_graph();
        let dot = Dot::with_attr_getters(
            &graph,
            &[Config::NodeNoLabel, Config::EdgeNoLabel],
            &|_, er| format!("label = {:?}", er.weight()),
            &|_, (_, process)| format!("label = \"{}\"", process),
        );
        format!("{:?}", dot)
    }
}

/// Build a [`ModelList`] from models and initial values
///
/// Initial values are scalars (the same at every time step) or series (one value per time
/// step). The number of time steps is the length of the longest series, or the one given
/// with [`with_time_steps`](ModelListBuilder::with_time_steps).
#[derive(Debug, Clone, Default)]
pub struct ModelListBuilder {
    models: ProcessModels,
    initial_values: BTreeMap<String, StatusValue>,
    time_steps: Option<usize>,
    policy: InitPolicy,
}

impl ModelListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_light_interception(
        &mut self,
        model: impl Into<LightInterceptionModel>,
    ) -> &mut Self {
        self.models.light_interception = Some(model.into());
        self
    }

    pub fn with_energy_balance(&mut self, model: impl Into<EnergyBalanceModel>) -> &mut Self {
        self.models.energy_balance = Some(model.into());
        self
    }

    pub fn with_photosynthesis(&mut self, model: impl Into<PhotosynthesisModel>) -> &mut Self {
        self.models.photosynthesis = Some(model.into());
        self
    }

    pub fn with_stomatal_conductance(
        &mut self,
        model: impl Into<StomatalConductanceModel>,
    ) -> &mut Self {
        self.models.stomatal_conductance = Some(model.into());
        self
    }

    /// Replace all the process models at once
    pub fn with_models(&mut self, models: ProcessModels) -> &mut Self {
        self.models = models;
        self
    }

    /// Set the initial value of a status variable
    pub fn with_status_value(&mut self, name: &str, value: impl Into<StatusValue>) -> &mut Self {
        self.initial_values.insert(name.to_string(), value.into());
        self
    }

    /// Set the initial values of several status variables
    pub fn with_status<I, S, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<StatusValue>,
    {
        self.initial_values
            .extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Number of time steps, when it is not given by the length of a series
    pub fn with_time_steps(&mut self, time_steps: usize) -> &mut Self {
        self.time_steps = Some(time_steps);
        self
    }

    pub fn with_init_policy(&mut self, policy: InitPolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    /// Build the object
    ///
    /// # Errors
    ///
    /// - [`BiophysError::UnknownVariable`] if an initial value is given for a variable that
    ///   no bound model declares
    /// - [`BiophysError::MismatchedLength`] if series of different lengths are given, or if
    ///   their length differs from the number of time steps
    pub fn build(&self) -> BiophysResult<ModelList> {
        let values = homogeneous_time_steps(self.initial_values.clone())?;
        let bound = self.models.bound();

        let rows = values
            .iter()
            .map(|row| init_status(&bound, row.iter().map(|(k, v)| (k, *v))))
            .collect::<BiophysResult<Vec<_>>>()?;
        let mut status = TimeStepTable::new(rows)?;

        if let Some(time_steps) = self.time_steps {
            status.broadcast(time_steps)?;
        }

        Ok(ModelList {
            models: self.models.clone(),
            status,
            policy: self.policy,
        })
    }
}
