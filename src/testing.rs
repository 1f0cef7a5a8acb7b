//! Test helpers: thread-local reset and a configurable component.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::reset_config;
use crate::engine::scheduler::reset_scheduler;
use crate::error::Result;
use crate::renderer::{NodeHandle, Template, TreeTemplate, VNode};
use crate::types::Attributes;
use crate::widget::{reset_ids, Component, InitOutcome, Widget};

pub type Log = Rc<RefCell<Vec<String>>>;
type Hook = Rc<dyn Fn(&Widget) -> Result<()>>;
type View = Rc<dyn Fn(&Widget) -> Result<VNode>>;

/// Reset every thread-local the widget core keeps.
pub fn reset_all() {
    crate::logging::init_for_tests();
    reset_scheduler();
    reset_config();
    reset_ids();
}

/// Component whose hooks and view are set per test.
#[derive(Clone)]
pub struct TestComponent {
    log: Option<(Log, &'static str)>,
    has_template: bool,
    async_init: bool,
    defaults: Attributes,
    view: View,
    on_create: Option<Hook>,
    on_update: Option<Hook>,
    on_destroy: Option<Hook>,
    renders: Rc<Cell<usize>>,
}

impl TestComponent {
    pub fn new() -> Self {
        Self {
            log: None,
            has_template: true,
            async_init: false,
            defaults: Attributes::new(),
            view: Rc::new(|_| Ok(VNode::element("div", Vec::new()))),
            on_create: None,
            on_update: None,
            on_destroy: None,
            renders: Rc::new(Cell::new(0)),
        }
    }

    /// Record `<tag>:<hook>` into `log` for every hook that runs.
    pub fn logging_to(mut self, log: &Log, tag: &'static str) -> Self {
        self.log = Some((log.clone(), tag));
        self
    }

    pub fn without_template(mut self) -> Self {
        self.has_template = false;
        self
    }

    /// Return a pending init future that settles on the next `run_until_idle`.
    pub fn with_async_init(mut self) -> Self {
        self.async_init = true;
        self
    }

    pub fn with_defaults(mut self, defaults: Attributes) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_view<F>(mut self, view: F) -> Self
    where
        F: Fn(&Widget) -> Result<VNode> + 'static,
    {
        self.view = Rc::new(view);
        self
    }

    pub fn on_create<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Widget) -> Result<()> + 'static,
    {
        self.on_create = Some(Rc::new(hook));
        self
    }

    pub fn on_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Widget) -> Result<()> + 'static,
    {
        self.on_update = Some(Rc::new(hook));
        self
    }

    pub fn on_destroy<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Widget) -> Result<()> + 'static,
    {
        self.on_destroy = Some(Rc::new(hook));
        self
    }

    /// Shared counter of view invocations.
    pub fn renders(&self) -> Rc<Cell<usize>> {
        self.renders.clone()
    }

    fn record(&self, hook: &str) {
        if let Some((log, tag)) = &self.log {
            log.borrow_mut().push(format!("{tag}:{hook}"));
        }
    }
}

impl Component for TestComponent {
    fn template(&self) -> Option<Rc<dyn Template>> {
        if !self.has_template {
            return None;
        }
        let view = self.view.clone();
        let renders = self.renders.clone();
        Some(Rc::new(TreeTemplate::new(move |widget| {
            renders.set(renders.get() + 1);
            view(widget)
        })))
    }

    fn defaults(&self) -> Attributes {
        self.defaults.clone()
    }

    fn init(&self, _widget: &Widget) -> Result<InitOutcome> {
        if self.async_init {
            return Ok(InitOutcome::pending(async { Ok(()) }));
        }
        Ok(InitOutcome::Ready)
    }

    fn create(&self, widget: &Widget) -> Result<()> {
        self.record("create");
        match &self.on_create {
            Some(hook) => hook(widget),
            None => Ok(()),
        }
    }

    fn before_update(&self, _widget: &Widget, _prev: Option<&Widget>, _dom: Option<&NodeHandle>) -> Result<()> {
        self.record("before_update");
        Ok(())
    }

    fn update(&self, widget: &Widget, _prev: Option<&Widget>, _dom: Option<&NodeHandle>) -> Result<()> {
        self.record("update");
        match &self.on_update {
            Some(hook) => hook(widget),
            None => Ok(()),
        }
    }

    fn destroy(&self, widget: &Widget, _dom: Option<&NodeHandle>) -> Result<()> {
        self.record("destroy");
        match &self.on_destroy {
            Some(hook) => hook(widget),
            None => Ok(()),
        }
    }
}
