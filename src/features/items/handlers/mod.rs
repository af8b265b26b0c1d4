pub mod item_handler;

pub use item_handler::{
    __path_create_item, __path_delete_item, __path_list_items, __path_update_item, create_item,
    delete_item, list_items, update_item, ItemsState,
};
