//! Paginación en memoria
//!
//! Las listas se filtran por igualdad en el almacén y la búsqueda por texto
//! se aplica después; la paginación corta el resultado final (1-indexada).

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Valores ausentes o cero caen a los valores por defecto
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            limit: limit
                .filter(|l| *l > 0)
                .unwrap_or(default_limit)
                .min(MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> usize {
        ((self.page - 1) as usize).saturating_mul(self.limit as usize)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Corta una lista ya filtrada y calcula los metadatos
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let limit = request.limit.max(1) as u64;
    let pages = (total + limit - 1) / limit;

    let items = items
        .into_iter()
        .skip(request.offset())
        .take(request.limit as usize)
        .collect();

    Page {
        items,
        pagination: PaginationMeta {
            page: request.page,
            limit: request.limit,
            total,
            pages,
        },
    }
}
