//! Routes, the navigation drawer and the navigator seam.

use std::rc::Rc;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

/// Id segment that opens a detail page for a new record.
pub const NEW_RECORD: &str = "nova";

/// Where the application starts.
pub const HOME: &str = "/pagina-inicial";

/// Moves the application to another route.
pub trait Navigator {
    /// Navigates to `path`.
    fn navigate(&self, path: &str);
}

impl<T: Navigator + ?Sized> Navigator for &T {
    fn navigate(&self, path: &str) {
        (**self).navigate(path);
    }
}

impl<T: Navigator + ?Sized> Navigator for Rc<T> {
    fn navigate(&self, path: &str) {
        (**self).navigate(path);
    }
}

impl<T: Navigator + ?Sized> Navigator for Arc<T> {
    fn navigate(&self, path: &str) {
        (**self).navigate(path);
    }
}

/// Records every navigation. The current route is the last entry.
#[derive(Debug, Default)]
pub struct History {
    entries: Mutex<Vec<String>>,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every route visited, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns the current route.
    pub fn current(&self) -> Option<String> {
        self.entries.lock().last().cloned()
    }

    /// Returns how many navigations happened.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns whether nothing navigated yet.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Navigator for History {
    fn navigate(&self, path: &str) {
        debug!(path, "navigate");
        self.entries.lock().push(path.to_string());
    }
}

/// List and detail routes of one screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routes {
    /// Listing route, e.g. `/pessoas`.
    pub list: &'static str,
    /// Detail route prefix, e.g. `/pessoas/detalhe`.
    pub detail: &'static str,
}

impl Routes {
    /// Creates a route pair.
    pub const fn new(list: &'static str, detail: &'static str) -> Self {
        Self { list, detail }
    }

    /// Returns the detail route for `id`.
    pub fn detail(&self, id: impl std::fmt::Display) -> String {
        format!("{}/{id}", self.detail)
    }

    /// Returns the detail route for a new record.
    pub fn new_record(&self) -> String {
        self.detail(NEW_RECORD)
    }
}

/// One entry of the navigation drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawerOption {
    pub icon: &'static str,
    pub path: &'static str,
    pub label: &'static str,
}

/// The drawer entries, in display order.
pub fn drawer_options() -> Vec<DrawerOption> {
    vec![
        DrawerOption {
            icon: "home",
            path: HOME,
            label: "Página inicial",
        },
        DrawerOption {
            icon: "listAltIcon",
            path: "/pre-orcamento",
            label: "Pré-Orçamentos",
        },
        DrawerOption {
            icon: "inventoryIcon",
            path: "/items",
            label: "Itens/Produtos",
        },
        DrawerOption {
            icon: "people",
            path: "/pessoas",
            label: "Clientes",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_routes() {
        let routes = Routes::new("/pessoas", "/pessoas/detalhe");
        assert_eq!(routes.detail(42), "/pessoas/detalhe/42");
        assert_eq!(routes.new_record(), "/pessoas/detalhe/nova");
    }

    #[test]
    fn history_tracks_current_route() {
        let history = Rc::new(History::new());
        let nav: Rc<History> = Rc::clone(&history);
        nav.navigate("/items");
        nav.navigate("/items/detail/1");
        assert_eq!(history.current().as_deref(), Some("/items/detail/1"));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn drawer_points_at_list_routes() {
        let paths: Vec<_> = drawer_options().iter().map(|o| o.path).collect();
        assert_eq!(paths, vec![HOME, "/pre-orcamento", "/items", "/pessoas"]);
    }
}
