mod decode_column;
mod encode_column_def;

use decode_column::decode_column;
use encode_column_def::encode_column_def;
use proc_macro::TokenStream;
use quote::quote;
use syn::{Fields, ItemStruct, parse_macro_input};

/// Implements `spool::Entity` for a struct with named fields.
///
/// Every field is a member unless marked `#[spool(skip)]`. The member name is
/// the field name without a leading underscore, or `#[spool(name = "...")]`.
/// Field types must implement `AsValue` and `Clone`.
#[proc_macro_derive(Entity, attributes(spool))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let name = &item.ident;
    let Fields::Named(..) = &item.fields else {
        panic!("Entity can only be derived for structs with named fields");
    };
    let columns = item
        .fields
        .iter()
        .map(decode_column)
        .filter(|c| !c.skip)
        .collect::<Vec<_>>();
    for (i, column) in columns.iter().enumerate() {
        if columns[..i].iter().any(|c| c.name == column.name) {
            panic!(
                "Member name `{}` is used by more than one field of `{}`",
                column.name, name
            );
        }
    }
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();
    let columns_defs = columns.iter().map(encode_column_def);
    let get_arms = columns.iter().enumerate().map(|(i, c)| {
        let field = &c.ident;
        quote!(#i => ::spool::AsValue::as_value(::std::clone::Clone::clone(&self.#field)))
    });
    let set_arms = columns.iter().enumerate().map(|(i, c)| {
        let field = &c.ident;
        let ty = &c.ty;
        quote!(#i => self.#field = <#ty as ::spool::AsValue>::try_from_value(value)?)
    });
    quote! {
        impl #impl_generics ::spool::Entity for #name #ty_generics #where_clause {
            fn columns() -> &'static [::spool::ColumnDef] {
                static RESULT: ::std::sync::LazyLock<Box<[::spool::ColumnDef]>> =
                    ::std::sync::LazyLock::new(|| vec![#(#columns_defs),*].into_boxed_slice());
                &RESULT
            }

            fn get_column(&self, index: usize) -> Option<::spool::Value> {
                Some(match index {
                    #(#get_arms,)*
                    _ => return None,
                })
            }

            fn set_column(&mut self, index: usize, value: ::spool::Value) -> ::spool::Result<()> {
                match index {
                    #(#set_arms,)*
                    _ => {
                        return Err(::spool::Error::msg(format!(
                            "Member {} does not exist in `{}`",
                            index,
                            stringify!(#name),
                        )));
                    }
                }
                Ok(())
            }
        }
    }
    .into()
}
