//! Reusable UI components for admin pages.

pub mod data_table;

pub use data_table::{
    DataTableConfig, SortDir, SortValue, TableColumn, TableFilter, TableQuery, TableRow,
    TableState,
};
