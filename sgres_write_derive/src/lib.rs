extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DataEnum, DataStruct, DeriveInput, Fields, Index};

/// Derives `SgWrite` by writing each field in declaration order.
///
/// Enum variants write only their fields since the variant is selected from context when reading.
#[proc_macro_derive(SgWrite)]
pub fn sg_write_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let (write_body, size_body) = match &input.data {
        Data::Struct(DataStruct { fields, .. }) => struct_bodies(fields),
        Data::Enum(DataEnum { variants, .. }) => {
            let mut write_arms = Vec::new();
            let mut size_arms = Vec::new();
            for variant in variants {
                let variant_name = &variant.ident;
                let bindings: Vec<_> = (0..variant.fields.len())
                    .map(|i| format_ident!("f{}", i))
                    .collect();
                let pattern = match &variant.fields {
                    Fields::Named(fields) => {
                        let names = fields.named.iter().map(|f| &f.ident);
                        quote!(Self::#variant_name { #(#names: #bindings),* })
                    }
                    Fields::Unnamed(_) => quote!(Self::#variant_name(#(#bindings),*)),
                    Fields::Unit => quote!(Self::#variant_name),
                };
                write_arms.push(quote! {
                    #pattern => {
                        #(
                            ::sgres_write::SgWrite::sg_write(#bindings, writer)?;
                        )*
                    }
                });
                size_arms.push(quote! {
                    #pattern => 0u64 #(+ ::sgres_write::SgWrite::size_in_bytes(#bindings))*,
                });
            }
            (
                quote! {
                    match self {
                        #(#write_arms)*
                    }
                    Ok(())
                },
                quote! {
                    match self {
                        #(#size_arms)*
                    }
                },
            )
        }
        Data::Union(_) => {
            return syn::Error::new_spanned(&input.ident, "SgWrite does not support unions")
                .to_compile_error()
                .into()
        }
    };

    let expanded = quote! {
        impl #impl_generics ::sgres_write::SgWrite for #name #ty_generics #where_clause {
            fn sg_write<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
                #write_body
            }

            fn size_in_bytes(&self) -> u64 {
                #size_body
            }
        }
    };

    TokenStream::from(expanded)
}

fn struct_bodies(fields: &Fields) -> (TokenStream2, TokenStream2) {
    let accessors: Vec<_> = match fields {
        Fields::Named(fields) => fields
            .named
            .iter()
            .map(|f| {
                let ident = &f.ident;
                quote!(self.#ident)
            })
            .collect(),
        Fields::Unnamed(fields) => (0..fields.unnamed.len())
            .map(|i| {
                let index = Index::from(i);
                quote!(self.#index)
            })
            .collect(),
        Fields::Unit => Vec::new(),
    };

    (
        quote! {
            #(
                ::sgres_write::SgWrite::sg_write(&#accessors, writer)?;
            )*
            Ok(())
        },
        quote! {
            0u64 #(+ ::sgres_write::SgWrite::size_in_bytes(&#accessors))*
        },
    )
}
